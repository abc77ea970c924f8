//! Builders for synthetic storages used by the unit tests.

use msox::{NamedProperty, PropertyNameInfo, PropertyTag, PropType};
use msox::property_sets::{PS_MAPI, PS_PUBLIC_STRINGS};
use uuid::Uuid;

use crate::assemble::{ATTACH_STORAGE_PREFIX, RECIP_STORAGE_PREFIX};
use crate::nameid::{ENTRY_STREAM, GUID_STREAM, NAMEID_STORAGE, STRING_STREAM};
use crate::props_stream::{StorageRole, PROPATTR_READABLE, PROPATTR_WRITABLE, PROPERTIES_STREAM};
use crate::storage::StorageNode;


/// Entry value bytes for an externally stored value of `size` bytes.
pub(crate) fn entry_bytes(size: u32) -> [u8; 8] {
    let mut value = [0u8; 8];
    value[0..4].copy_from_slice(&size.to_le_bytes());
    value
}

/// Left-aligns `bytes` in an eight-byte entry value.
pub(crate) fn inline_value(bytes: &[u8]) -> [u8; 8] {
    let mut value = [0u8; 8];
    value[0..bytes.len()].copy_from_slice(bytes);
    value
}

/// UTF-16LE with a terminating NUL, as strings are stored in value streams.
pub(crate) fn utf16z(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.encode_utf16().flat_map(|w| w.to_le_bytes()).collect();
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

pub(crate) fn properties_stream(role: StorageRole, entries: &[(PropertyTag, [u8; 8])]) -> Vec<u8> {
    properties_stream_with_counts(role, entries, 0, 0)
}

fn properties_stream_with_counts(role: StorageRole, entries: &[(PropertyTag, [u8; 8])], recipients: u32, attachments: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; role.header_length()];
    if role.is_message() {
        bytes[8..12].copy_from_slice(&recipients.to_le_bytes());
        bytes[12..16].copy_from_slice(&attachments.to_le_bytes());
        bytes[16..20].copy_from_slice(&recipients.to_le_bytes());
        bytes[20..24].copy_from_slice(&attachments.to_le_bytes());
    }
    for (tag, value) in entries {
        bytes.extend_from_slice(&tag.prop_type.to_le_bytes());
        bytes.extend_from_slice(&tag.id.to_le_bytes());
        bytes.extend_from_slice(&(PROPATTR_READABLE|PROPATTR_WRITABLE).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}


/// One property to place in a synthetic storage: its entry plus whatever
/// value streams or storages go with it.
pub(crate) struct PropSpec {
    pub tag: PropertyTag,
    pub value: [u8; 8],
    pub children: Vec<StorageNode>,
}

pub(crate) fn i32_prop(id: u16, v: i32) -> PropSpec {
    PropSpec { tag: PropertyTag::new(id, PropType::Integer32), value: inline_value(&v.to_le_bytes()), children: vec![] }
}

pub(crate) fn bool_prop(id: u16, b: bool) -> PropSpec {
    PropSpec { tag: PropertyTag::new(id, PropType::Boolean), value: inline_value(&[u8::from(b), 0]), children: vec![] }
}

pub(crate) fn time_prop(id: u16, filetime: i64) -> PropSpec {
    PropSpec { tag: PropertyTag::new(id, PropType::Time), value: inline_value(&filetime.to_le_bytes()), children: vec![] }
}

pub(crate) fn f64_prop(id: u16, v: f64) -> PropSpec {
    PropSpec { tag: PropertyTag::new(id, PropType::Floating64), value: inline_value(&v.to_le_bytes()), children: vec![] }
}

pub(crate) fn string_prop(id: u16, s: &str) -> PropSpec {
    let tag = PropertyTag::new(id, PropType::String);
    let data = utf16z(s);
    PropSpec {
        tag,
        value: entry_bytes(data.len() as u32),
        children: vec![StorageNode::stream(tag.stream_name(), data)],
    }
}

pub(crate) fn string8_prop(id: u16, s: &str) -> PropSpec {
    let tag = PropertyTag::new(id, PropType::String8);
    PropSpec {
        tag,
        value: entry_bytes(s.len() as u32 + 1),
        children: vec![StorageNode::stream(tag.stream_name(), s.as_bytes().to_vec())],
    }
}

pub(crate) fn binary_prop(id: u16, data: &[u8]) -> PropSpec {
    let tag = PropertyTag::new(id, PropType::Binary);
    PropSpec {
        tag,
        value: entry_bytes(data.len() as u32),
        children: vec![StorageNode::stream(tag.stream_name(), data.to_vec())],
    }
}

pub(crate) fn mv_string_prop(id: u16, values: &[&str]) -> PropSpec {
    let tag = PropertyTag::new(id, PropType::MultipleString);
    let mut lengths = Vec::new();
    let mut children = Vec::new();
    for (index, value) in values.iter().enumerate() {
        let data = utf16z(value);
        lengths.extend_from_slice(&(data.len() as u32).to_le_bytes());
        children.push(StorageNode::stream(tag.element_stream_name(index as u32), data));
    }
    children.push(StorageNode::stream(tag.stream_name(), lengths.clone()));
    PropSpec { tag, value: entry_bytes(lengths.len() as u32), children }
}

/// An embedded-message attachment value: the nested message storage.
pub(crate) fn object_storage_prop(id: u16, nested: StorageNode) -> PropSpec {
    let tag = PropertyTag::new(id, PropType::Object);
    PropSpec { tag, value: entry_bytes(0xFFFF_FFFF), children: vec![nested] }
}

/// Builds a storage holding a properties stream for `role`, the value
/// streams of `props` and any `extra` children (sub-storages, name-id
/// mapping, ...). Message headers get recipient/attachment counts matching
/// the extra children.
pub(crate) fn storage_with(name: &str, role: StorageRole, props: Vec<PropSpec>, extra: Vec<StorageNode>) -> StorageNode {
    let recipients = extra.iter().filter(|c| c.name().starts_with(RECIP_STORAGE_PREFIX)).count() as u32;
    let attachments = extra.iter().filter(|c| c.name().starts_with(ATTACH_STORAGE_PREFIX)).count() as u32;

    let entries: Vec<(PropertyTag, [u8; 8])> = props.iter().map(|p| (p.tag, p.value)).collect();
    let mut children = vec![StorageNode::stream(
        PROPERTIES_STREAM,
        properties_stream_with_counts(role, &entries, recipients, attachments),
    )];
    for prop in props {
        children.extend(prop.children);
    }
    children.extend(extra);
    StorageNode::storage(name, children)
}

/// Raw streams of a name-id mapping storage for `(property, property index)`
/// pairs.
pub(crate) fn nameid_streams(entries: &[(NamedProperty, u16)]) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut guids: Vec<Uuid> = Vec::new();
    let mut guid_bytes = Vec::new();
    let mut record_bytes = Vec::new();
    let mut string_bytes = Vec::new();

    for (named, property_index) in entries {
        let guid_index: u32 = if named.property_set == PS_MAPI {
            1
        } else if named.property_set == PS_PUBLIC_STRINGS {
            2
        } else {
            let position = match guids.iter().position(|g| *g == named.property_set) {
                Some(p) => p,
                None => {
                    guids.push(named.property_set);
                    guid_bytes.extend_from_slice(&named.property_set.to_bytes_le());
                    guids.len() - 1
                },
            };
            3 + position as u32
        };

        let (name_or_offset, kind) = match &named.name {
            PropertyNameInfo::DisplayId(id) => (*id, 0u32),
            PropertyNameInfo::Name(name) => {
                let offset = string_bytes.len() as u32;
                let utf16: Vec<u8> = name.encode_utf16().flat_map(|w| w.to_le_bytes()).collect();
                string_bytes.extend_from_slice(&(utf16.len() as u32).to_le_bytes());
                string_bytes.extend_from_slice(&utf16);
                while string_bytes.len() % 4 != 0 {
                    string_bytes.push(0);
                }
                (offset, 1u32)
            },
        };
        let index_and_kind = (u32::from(*property_index) << 16) | (guid_index << 1) | kind;
        record_bytes.extend_from_slice(&name_or_offset.to_le_bytes());
        record_bytes.extend_from_slice(&index_and_kind.to_le_bytes());
    }

    (guid_bytes, record_bytes, string_bytes)
}

pub(crate) fn nameid_storage(entries: &[(NamedProperty, u16)]) -> StorageNode {
    let (guids, entries, strings) = nameid_streams(entries);
    StorageNode::storage(NAMEID_STORAGE, vec![
        StorageNode::stream(GUID_STREAM, guids),
        StorageNode::stream(ENTRY_STREAM, entries),
        StorageNode::stream(STRING_STREAM, strings),
    ])
}
