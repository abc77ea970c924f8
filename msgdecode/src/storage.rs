//! The compound-file tree as seen by the decoder.
//!
//! Decoding never touches the file directly. A [`CompoundSource`] (in
//! practice a [`cfb::CompoundFile`]) is read once into a tree of
//! [`StorageNode`]s that owns every stream's bytes.

use std::io::{self, Read, Seek};
use std::path::Path;

use cfb::CompoundFile;
use log::debug;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NodeKind {
    Storage,
    Stream,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChildEntry {
    pub name: String,
    pub kind: NodeKind,
}


/// Read access to a compound file: list a storage, read a stream.
pub trait CompoundSource {
    fn list_children(&mut self, storage: &Path) -> io::Result<Vec<ChildEntry>>;
    fn read_stream(&mut self, storage: &Path, name: &str) -> io::Result<Vec<u8>>;
}

impl<F: Read + Seek> CompoundSource for CompoundFile<F> {
    fn list_children(&mut self, storage: &Path) -> io::Result<Vec<ChildEntry>> {
        let mut children = Vec::new();
        for entry in self.read_storage(storage)? {
            let kind = if entry.is_storage() {
                NodeKind::Storage
            } else {
                NodeKind::Stream
            };
            children.push(ChildEntry {
                name: entry.name().to_owned(),
                kind,
            });
        }
        Ok(children)
    }

    fn read_stream(&mut self, storage: &Path, name: &str) -> io::Result<Vec<u8>> {
        let mut stream = self.open_stream(storage.join(name))?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }
}


/// One storage or stream of a materialized compound file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageNode {
    name: String,
    kind: NodeKind,
    children: Vec<StorageNode>,
    data: Vec<u8>,
}
impl StorageNode {
    pub fn storage<S: Into<String>>(name: S, children: Vec<StorageNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Storage,
            children,
            data: Vec::new(),
        }
    }

    pub fn stream<S: Into<String>, D: Into<Vec<u8>>>(name: S, data: D) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Stream,
            children: Vec::new(),
            data: data.into(),
        }
    }

    /// Reads the whole tree below the root storage of `source`.
    pub fn materialize<S: CompoundSource>(source: &mut S) -> io::Result<Self> {
        Self::materialize_at(source, Path::new("/"), String::from("Root Entry"))
    }

    fn materialize_at<S: CompoundSource>(source: &mut S, path: &Path, name: String) -> io::Result<Self> {
        let entries = source.list_children(path)?;
        debug!("materializing {} ({} children)", path.display(), entries.len());

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let child = match entry.kind {
                NodeKind::Storage => {
                    let child_path = path.join(&entry.name);
                    Self::materialize_at(source, &child_path, entry.name)?
                },
                NodeKind::Stream => {
                    let data = source.read_stream(path, &entry.name)?;
                    Self::stream(entry.name, data)
                },
            };
            children.push(child);
        }
        Ok(Self::storage(name, children))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_storage(&self) -> bool {
        self.kind == NodeKind::Storage
    }

    pub fn children(&self) -> &[StorageNode] {
        &self.children
    }

    /// Stream contents; empty for storages.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Finds a direct child by name. Compound-file names compare without
    /// regard to ASCII case.
    pub fn child(&self, name: &str) -> Option<&StorageNode> {
        self.children.iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn stream_data(&self, name: &str) -> Option<&[u8]> {
        self.child(name)
            .filter(|c| c.kind == NodeKind::Stream)
            .map(|c| c.data.as_slice())
    }

    pub fn sub_storage(&self, name: &str) -> Option<&StorageNode> {
        self.child(name)
            .filter(|c| c.kind == NodeKind::Storage)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// A source backed by a path-to-children map.
    struct MapSource {
        storages: BTreeMap<PathBuf, Vec<ChildEntry>>,
        streams: BTreeMap<PathBuf, Vec<u8>>,
        reads: usize,
    }
    impl CompoundSource for MapSource {
        fn list_children(&mut self, storage: &Path) -> io::Result<Vec<ChildEntry>> {
            self.storages.get(storage)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such storage"))
        }

        fn read_stream(&mut self, storage: &Path, name: &str) -> io::Result<Vec<u8>> {
            self.reads += 1;
            self.streams.get(&storage.join(name))
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such stream"))
        }
    }

    #[test]
    fn test_materialize() {
        let mut storages = BTreeMap::new();
        storages.insert(PathBuf::from("/"), vec![
            ChildEntry { name: "__properties_version1.0".into(), kind: NodeKind::Stream },
            ChildEntry { name: "__recip_version1.0_#00000000".into(), kind: NodeKind::Storage },
        ]);
        storages.insert(PathBuf::from("/__recip_version1.0_#00000000"), vec![
            ChildEntry { name: "__substg1.0_3001001F".into(), kind: NodeKind::Stream },
        ]);
        let mut streams = BTreeMap::new();
        streams.insert(PathBuf::from("/__properties_version1.0"), vec![0u8; 32]);
        streams.insert(PathBuf::from("/__recip_version1.0_#00000000/__substg1.0_3001001F"), vec![b'a', 0]);
        let mut source = MapSource { storages, streams, reads: 0 };

        let root = StorageNode::materialize(&mut source).unwrap();
        assert_eq!(source.reads, 2);
        assert!(root.is_storage());
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.stream_data("__properties_version1.0").map(|d| d.len()), Some(32));
        let recip = root.sub_storage("__recip_version1.0_#00000000").unwrap();
        assert_eq!(recip.stream_data("__substg1.0_3001001F"), Some(&[b'a', 0][..]));
    }

    #[test]
    fn test_child_lookup() {
        let node = StorageNode::storage("root", vec![
            StorageNode::stream("__substg1.0_0037001F", vec![1, 2]),
            StorageNode::storage("__nameid_version1.0", vec![]),
        ]);
        assert!(node.child("__SUBSTG1.0_0037001f").is_some());
        assert!(node.stream_data("__nameid_version1.0").is_none());
        assert!(node.sub_storage("__nameid_version1.0").is_some());
        assert!(node.sub_storage("__substg1.0_0037001F").is_none());
        assert!(node.child("missing").is_none());
    }
}
