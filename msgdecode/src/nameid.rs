//! Named-property mapping.
//!
//! Properties in the 0x8000..=0xFFFE range carry no fixed meaning; the
//! `__nameid_version1.0` storage records which (property set, name) pair
//! each of them stands for in this particular file.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

use log::{debug, warn};
use msox::{BinaryReader, NamedProperty, PropertyNameInfo, NAMED_PROPERTY_MAX, NAMED_PROPERTY_MIN};
use msox::property_sets::{PS_MAPI, PS_PUBLIC_STRINGS};
use uuid::Uuid;

use crate::error::DecodeError;
use crate::storage::StorageNode;


pub const NAMEID_STORAGE: &str = "__nameid_version1.0";
pub const GUID_STREAM: &str = "__substg1.0_00020102";
pub const ENTRY_STREAM: &str = "__substg1.0_00030102";
pub const STRING_STREAM: &str = "__substg1.0_00040102";

const GUID_SIZE: usize = 16;
const ENTRY_RECORD_SIZE: usize = 8;


/// Translation between named-range property ids and the named properties
/// they stand for, valid within one message (and the embedded messages that
/// do not bring their own mapping).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameIdMap {
    by_id: BTreeMap<u16, NamedProperty>,
    by_name: HashMap<NamedProperty, u16>,
}
impl NameIdMap {
    /// Reads the mapping from a `__nameid_version1.0` storage. The entry
    /// stream is mandatory; GUID and string streams may be absent when
    /// nothing refers to them.
    pub fn from_storage(storage: &StorageNode) -> Result<Self, DecodeError> {
        let entries = storage.stream_data(ENTRY_STREAM)
            .ok_or_else(|| DecodeError::MissingStream {
                storage: storage.name().to_owned(),
                stream: ENTRY_STREAM.to_owned(),
            })?;
        let guids = storage.stream_data(GUID_STREAM).unwrap_or(&[]);
        let strings = storage.stream_data(STRING_STREAM).unwrap_or(&[]);
        Self::from_streams(guids, entries, strings)
    }

    pub fn from_streams(guids: &[u8], entries: &[u8], strings: &[u8]) -> Result<Self, DecodeError> {
        if guids.len() % GUID_SIZE != 0 {
            return Err(DecodeError::NameIdStreamLength {
                stream: GUID_STREAM.to_owned(),
                byte_length: guids.len(),
                record_size: GUID_SIZE,
            });
        }
        if entries.len() % ENTRY_RECORD_SIZE != 0 {
            return Err(DecodeError::NameIdStreamLength {
                stream: ENTRY_STREAM.to_owned(),
                byte_length: entries.len(),
                record_size: ENTRY_RECORD_SIZE,
            });
        }

        let guid_table: Vec<Uuid> = guids
            .chunks_exact(GUID_SIZE)
            .map(|chunk| {
                let mut buf = [0u8; GUID_SIZE];
                buf.copy_from_slice(chunk);
                Uuid::from_bytes_le(buf)
            })
            .collect();

        let mut map = Self::default();
        let mut reader = Cursor::new(entries);
        while let Some(name_or_offset) = reader.read_u32_le_or_eof()? {
            let index_and_kind = reader.read_u32_le()?;

            // bit 0: kind (0 = numeric, 1 = string)
            // bits 1..16: GUID index
            // bits 16..32: property index
            let is_string = index_and_kind & 0x1 != 0;
            let guid_index = ((index_and_kind >> 1) & 0x7FFF) as usize;
            let property_index = index_and_kind >> 16;

            let property_set = match guid_index {
                1 => PS_MAPI,
                2 => PS_PUBLIC_STRINGS,
                n if n >= 3 && n - 3 < guid_table.len() => guid_table[n - 3],
                other => {
                    warn!("named property index {} refers to GUID index {} which does not exist; skipping", property_index, other);
                    continue;
                },
            };

            let name = if is_string {
                match read_name_string(strings, name_or_offset) {
                    Some(s) => PropertyNameInfo::Name(s),
                    None => {
                        warn!("named property index {} has unreadable name at string offset {}; skipping", property_index, name_or_offset);
                        continue;
                    },
                }
            } else {
                PropertyNameInfo::DisplayId(name_or_offset)
            };

            let id = u32::from(NAMED_PROPERTY_MIN) + property_index;
            if id > u32::from(NAMED_PROPERTY_MAX) {
                warn!("named property index {} does not fit the named range; skipping", property_index);
                continue;
            }
            let id = id as u16;

            map.insert(id, NamedProperty { property_set, name });
        }

        debug!("name-id mapping has {} entries", map.len());
        Ok(map)
    }

    fn insert(&mut self, id: u16, named: NamedProperty) {
        if let Some(existing) = self.by_id.get(&id) {
            warn!("property id 0x{:04X} mapped twice ({} and {}); keeping the first", id, existing, named);
            return;
        }
        if let Some(other_id) = self.by_name.get(&named) {
            warn!("{} mapped to both 0x{:04X} and 0x{:04X}; keeping the first", named, other_id, id);
            return;
        }
        self.by_name.insert(named.clone(), id);
        self.by_id.insert(id, named);
    }

    /// The named property a named-range id stands for.
    pub fn resolve(&self, id: u16) -> Option<&NamedProperty> {
        self.by_id.get(&id)
    }

    /// The numeric id assigned to a named property in this file.
    pub fn id_of(&self, named: &NamedProperty) -> Option<u16> {
        self.by_name.get(named).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Mappings in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &NamedProperty)> {
        self.by_id.iter().map(|(id, named)| (*id, named))
    }
}


/// Reads a length-prefixed UTF-16LE name from the string stream.
fn read_name_string(strings: &[u8], offset: u32) -> Option<String> {
    let offset = usize::try_from(offset).ok()?;
    let record = strings.get(offset..)?;
    let mut reader = Cursor::new(record);
    let byte_count = usize::try_from(reader.read_u32_le().ok()?).ok()?;
    if byte_count > record.len() - 4 || byte_count % 2 != 0 {
        return None;
    }
    reader.read_utf16_le(byte_count).ok()?.ok()
}
