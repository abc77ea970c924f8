use std::io::{Cursor, Read};

use log::debug;
use msox::{BinaryReader, PropertyTag};

use crate::error::DecodeError;


/// Name of the stream listing a storage's properties.
pub const PROPERTIES_STREAM: &str = "__properties_version1.0";

/// Width of one entry of the properties stream.
pub const ENTRY_SIZE: usize = 16;

pub const PROPATTR_MANDATORY: u32 = 0x0000_0001;
pub const PROPATTR_READABLE: u32 = 0x0000_0002;
pub const PROPATTR_WRITABLE: u32 = 0x0000_0004;


/// What a storage holds; decides the length of its properties stream header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageRole {
    TopLevel,
    Embedded,
    Recipient,
    Attachment,
}
impl StorageRole {
    pub fn header_length(&self) -> usize {
        match self {
            Self::TopLevel => 32,
            Self::Embedded => 24,
            Self::Recipient|Self::Attachment => 8,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Self::TopLevel|Self::Embedded)
    }
}


/// Bookkeeping carried in message-level headers.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PropertiesHeader {
    pub next_recipient_id: u32,
    pub next_attachment_id: u32,
    pub recipient_count: u32,
    pub attachment_count: u32,
}

/// One 16-byte entry of a properties stream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RawPropertyDescriptor {
    pub tag: PropertyTag,
    pub flags: u32,
    /// The value itself for fixed-width types; otherwise a byte size and four
    /// reserved bytes.
    pub value: [u8; 8],
}
impl RawPropertyDescriptor {
    pub fn is_inline(&self) -> bool {
        self.tag.prop_type().is_inline()
    }

    /// Name of the stream (or storage, for objects) holding the value when it
    /// is not inline.
    pub fn stream_reference(&self) -> Option<String> {
        if self.is_inline() {
            None
        } else {
            Some(self.tag.stream_name())
        }
    }

    /// Byte size recorded for a value that lives outside the entry.
    pub fn declared_size(&self) -> Option<u32> {
        if self.is_inline() {
            None
        } else {
            Some(u32::from_le_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]))
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PropertiesStream {
    /// Present for top-level and embedded messages.
    pub header: Option<PropertiesHeader>,
    pub entries: Vec<RawPropertyDescriptor>,
}


/// Parses a properties stream of a storage with the given role.
///
/// The entry array must fill the remainder of the stream exactly; anything
/// else means a damaged file or a layout we do not understand.
pub fn decode_properties_stream(bytes: &[u8], role: StorageRole) -> Result<PropertiesStream, DecodeError> {
    let header_length = role.header_length();
    if bytes.len() < header_length {
        return Err(DecodeError::HeaderTooShort { expected: header_length, obtained: bytes.len() });
    }
    let entry_bytes = bytes.len() - header_length;
    if entry_bytes % ENTRY_SIZE != 0 {
        return Err(DecodeError::EntryArrayLength { entry_bytes, entry_size: ENTRY_SIZE });
    }

    let mut reader = Cursor::new(bytes);

    // header:
    // 0..8 reserved
    // 8..12 next_recipient_id
    // 12..16 next_attachment_id
    // 16..20 recipient_count
    // 20..24 attachment_count
    // 24..32 reserved (top level only)
    let header = if role.is_message() {
        reader.skip(8)?;
        let header = PropertiesHeader {
            next_recipient_id: reader.read_u32_le()?,
            next_attachment_id: reader.read_u32_le()?,
            recipient_count: reader.read_u32_le()?,
            attachment_count: reader.read_u32_le()?,
        };
        reader.skip(header_length - 24)?;
        Some(header)
    } else {
        reader.skip(header_length)?;
        None
    };

    let mut entries = Vec::with_capacity(entry_bytes / ENTRY_SIZE);
    while let Some(type_u16) = reader.read_u16_le_or_eof()? {
        let id_u16 = reader.read_u16_le()?;
        let flags = reader.read_u32_le()?;
        let mut value = [0u8; 8];
        reader.read_exact(&mut value)?;

        let tag = PropertyTag { id: id_u16, prop_type: type_u16 };
        debug!("property entry {} flags 0x{:08X}", tag, flags);
        entries.push(RawPropertyDescriptor { tag, flags, value });
    }

    Ok(PropertiesStream { header, entries })
}
