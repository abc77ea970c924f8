//! Walks a message storage and builds the entity tree.

use encoding_rs::Encoding;
use log::{debug, error, warn};
use msox::{PropTag, PropType, PropValue, PropertyTag};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::entity::{
    AttachMethod, Attachment, Message, Property, PropertyFault, PropertyKey, PropertySet, Recipient,
    StorageFault,
};
use crate::error::DecodeError;
use crate::nameid::{NameIdMap, NAMEID_STORAGE};
use crate::options::{encoding_for_codepage, DecodeOptions};
use crate::props_stream::{
    decode_properties_stream, PropertiesStream, RawPropertyDescriptor, StorageRole, PROPERTIES_STREAM,
};
use crate::storage::StorageNode;
use crate::value::decode_value;


pub const RECIP_STORAGE_PREFIX: &str = "__recip_version1.0_#";
pub const ATTACH_STORAGE_PREFIX: &str = "__attach_version1.0_#";

/// Transport headers; preferred over anything reconstructed from other
/// properties.
pub const HEADER_STREAM: &str = "__substg1.0_007D001F";
pub const HEADER_STREAM_8BIT: &str = "__substg1.0_007D001E";

/// Sub-storage of an attachment holding its embedded message.
pub const EMBEDDED_MESSAGE_STORAGE: &str = "__substg1.0_3701000D";

static RECIP_STORAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(concat!(
    "(?i)",
    "^",
    "__recip_version1\\.0_#",
    "(?P<index>[0-9A-F]{8})",
    "$",
)).unwrap());
static ATTACH_STORAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(concat!(
    "(?i)",
    "^",
    "__attach_version1\\.0_#",
    "(?P<index>[0-9A-F]{8})",
    "$",
)).unwrap());


/// Decodes the root storage of a `.msg` file with default options.
pub fn decode_message(root: &StorageNode) -> Result<Message, DecodeError> {
    decode_message_with(root, &DecodeOptions::default())
}

/// Decodes the root storage of a `.msg` file.
///
/// Fails only if the root's own properties stream cannot be read. Broken
/// properties, recipients, attachments and embedded messages are recorded as
/// faults on the returned message instead.
pub fn decode_message_with(root: &StorageNode, options: &DecodeOptions) -> Result<Message, DecodeError> {
    let no_names = NameIdMap::default();
    decode_message_storage(root, StorageRole::TopLevel, &no_names, 0, options)
}


fn decode_message_storage(
    storage: &StorageNode,
    role: StorageRole,
    inherited_names: &NameIdMap,
    depth: usize,
    options: &DecodeOptions,
) -> Result<Message, DecodeError> {
    let mut faults = Vec::new();

    // the mapping has to be known before any named-range property is decoded
    let own_names = read_own_names(storage, &mut faults);
    let names = own_names.as_ref().unwrap_or(inherited_names);

    let stream = read_properties(storage, role)?;
    let encoding = string8_encoding(&stream.entries, options);
    let mut properties = decode_property_set(storage, &stream.entries, names, encoding);
    add_header_stream(storage, &mut properties, encoding);

    let recipient_storages = indexed_children(storage, &RECIP_STORAGE_RE);
    let attachment_storages = indexed_children(storage, &ATTACH_STORAGE_RE);
    if let Some(header) = &stream.header {
        if header.recipient_count as usize != recipient_storages.len() {
            warn!("{:?} declares {} recipients but {} recipient storages exist", storage.name(), header.recipient_count, recipient_storages.len());
        }
        if header.attachment_count as usize != attachment_storages.len() {
            warn!("{:?} declares {} attachments but {} attachment storages exist", storage.name(), header.attachment_count, attachment_storages.len());
        }
    }

    let mut recipients = Vec::new();
    for child in recipient_storages {
        match decode_recipient(child, names, encoding, &mut faults) {
            Ok(recipient) => recipients.push(recipient),
            Err(e) => {
                error!("failed to decode recipient {:?}: {}", child.name(), e);
                faults.push(StorageFault { storage: child.name().to_owned(), error: e });
            },
        }
    }

    let mut attachments = Vec::new();
    for child in attachment_storages {
        match decode_attachment(child, names, encoding, depth, options, &mut faults) {
            Ok(attachment) => attachments.push(attachment),
            Err(e) => {
                error!("failed to decode attachment {:?}: {}", child.name(), e);
                faults.push(StorageFault { storage: child.name().to_owned(), error: e });
            },
        }
    }

    Ok(Message {
        properties,
        recipients,
        attachments,
        header: stream.header,
        faults,
    })
}

fn decode_recipient(
    storage: &StorageNode,
    inherited_names: &NameIdMap,
    encoding: &'static Encoding,
    faults: &mut Vec<StorageFault>,
) -> Result<Recipient, DecodeError> {
    let own_names = read_own_names(storage, faults);
    let names = own_names.as_ref().unwrap_or(inherited_names);

    let stream = read_properties(storage, StorageRole::Recipient)?;
    let properties = decode_property_set(storage, &stream.entries, names, encoding);
    Ok(Recipient {
        storage: storage.name().to_owned(),
        properties,
    })
}

fn decode_attachment(
    storage: &StorageNode,
    inherited_names: &NameIdMap,
    encoding: &'static Encoding,
    depth: usize,
    options: &DecodeOptions,
    faults: &mut Vec<StorageFault>,
) -> Result<Attachment, DecodeError> {
    let own_names = read_own_names(storage, faults);
    let names = own_names.as_ref().unwrap_or(inherited_names);

    let stream = read_properties(storage, StorageRole::Attachment)?;
    let properties = decode_property_set(storage, &stream.entries, names, encoding);

    let is_embedded_message = properties.get_tag(PropTag::TagAttachMethod)
        .and_then(|v| v.as_integer())
        .map(|m| AttachMethod::from_base_type(m as i32) == AttachMethod::EmbeddedMessage)
        .unwrap_or(false);

    let mut embedded = None;
    if is_embedded_message {
        // the storage normally has the fixed name even when the entry is missing
        let nested_name = match properties.get_tag(PropTag::TagAttachDataBinary) {
            Some(PropValue::ObjectStorage(name)) => name.clone(),
            _ => EMBEDDED_MESSAGE_STORAGE.to_owned(),
        };
        match storage.sub_storage(&nested_name) {
            Some(nested) => {
                let path = format!("{}/{}", storage.name(), nested.name());
                let nested_depth = depth + 1;
                if nested_depth > options.max_embedding_depth {
                    warn!("not decoding {:?}: embedded {} levels deep", path, nested_depth);
                    faults.push(StorageFault { storage: path, error: DecodeError::EmbeddingTooDeep { depth: nested_depth } });
                } else {
                    match decode_message_storage(nested, StorageRole::Embedded, names, nested_depth, options) {
                        Ok(message) => embedded = Some(Box::new(message)),
                        Err(e) => {
                            error!("failed to decode embedded message {:?}: {}", path, e);
                            faults.push(StorageFault { storage: path, error: e });
                        },
                    }
                }
            },
            None => {
                error!("attachment {:?} is an embedded message but has no message storage", storage.name());
                faults.push(StorageFault {
                    storage: format!("{}/{}", storage.name(), nested_name),
                    error: DecodeError::MissingStream {
                        storage: storage.name().to_owned(),
                        stream: nested_name,
                    },
                });
            },
        }
    }

    Ok(Attachment {
        storage: storage.name().to_owned(),
        properties,
        embedded,
    })
}


/// Reads the storage's own name-id mapping, if it has one. A broken mapping
/// is recorded as a fault and treated as absent.
fn read_own_names(storage: &StorageNode, faults: &mut Vec<StorageFault>) -> Option<NameIdMap> {
    let nameid = storage.sub_storage(NAMEID_STORAGE)?;
    match NameIdMap::from_storage(nameid) {
        Ok(map) => Some(map),
        Err(e) => {
            error!("failed to read name-id mapping of {:?}: {}", storage.name(), e);
            faults.push(StorageFault {
                storage: format!("{}/{}", storage.name(), NAMEID_STORAGE),
                error: e,
            });
            None
        },
    }
}

fn read_properties(storage: &StorageNode, role: StorageRole) -> Result<PropertiesStream, DecodeError> {
    let bytes = storage.stream_data(PROPERTIES_STREAM)
        .ok_or_else(|| DecodeError::MissingStream {
            storage: storage.name().to_owned(),
            stream: PROPERTIES_STREAM.to_owned(),
        })?;
    decode_properties_stream(bytes, role)
}

/// Picks the encoding for 8-bit strings: the message code page, then the
/// internet code page, then the configured fallback.
fn string8_encoding(entries: &[RawPropertyDescriptor], options: &DecodeOptions) -> &'static Encoding {
    for tag in [PropTag::TagMessageCodepage, PropTag::TagInternetCodepage] {
        let id: u16 = tag.into();
        let entry = entries.iter()
            .find(|e| e.tag.id == id && e.tag.prop_type() == PropType::Integer32);
        let Some(entry) = entry else { continue };

        let codepage = i32::from_le_bytes([entry.value[0], entry.value[1], entry.value[2], entry.value[3]]);
        if let Some(encoding) = u16::try_from(codepage).ok().and_then(encoding_for_codepage) {
            debug!("8-bit strings use {} (from {:?})", encoding.name(), tag);
            return encoding;
        }
    }
    options.fallback_encoding()
}

fn decode_property_set(
    storage: &StorageNode,
    entries: &[RawPropertyDescriptor],
    names: &NameIdMap,
    encoding: &'static Encoding,
) -> PropertySet {
    let mut set = PropertySet::default();
    for raw in entries {
        match decode_property(raw, storage, names, encoding) {
            Ok(property) => set.push(property),
            Err(e) => {
                error!("failed to decode property {} of {:?}: {}", raw.tag, storage.name(), e);
                set.push_fault(PropertyFault { tag: raw.tag, error: e });
            },
        }
    }
    set
}

fn decode_property(
    raw: &RawPropertyDescriptor,
    storage: &StorageNode,
    names: &NameIdMap,
    encoding: &'static Encoding,
) -> Result<Property, DecodeError> {
    let key = if raw.tag.is_named() {
        match names.resolve(raw.tag.id) {
            Some(named) => PropertyKey::Named(named.clone()),
            None => {
                debug!("no name-id mapping for property {}", raw.tag);
                PropertyKey::UnresolvedNamed(raw.tag.id)
            },
        }
    } else {
        PropertyKey::Tagged(PropTag::from_base_type(raw.tag.id))
    };

    let value = decode_value(raw, storage, encoding)?;
    Ok(Property {
        tag: raw.tag,
        flags: raw.flags,
        key,
        value,
    })
}

/// Adds the transport headers from their dedicated stream when the
/// properties stream does not list them.
fn add_header_stream(storage: &StorageNode, properties: &mut PropertySet, encoding: &'static Encoding) {
    let id: u16 = PropTag::TagTransportMessageHeaders.into();
    if properties.get(id).is_some() {
        return;
    }

    for (stream, prop_type) in [(HEADER_STREAM, PropType::String), (HEADER_STREAM_8BIT, PropType::String8)] {
        let Some(bytes) = storage.stream_data(stream) else { continue };
        let mut value = [0u8; 8];
        value[0..4].copy_from_slice(&(bytes.len() as u32).to_le_bytes());
        let raw = RawPropertyDescriptor {
            tag: PropertyTag::new(id, prop_type),
            flags: 0,
            value,
        };
        match decode_value(&raw, storage, encoding) {
            Ok(value) => {
                properties.push(Property {
                    tag: raw.tag,
                    flags: raw.flags,
                    key: PropertyKey::Tagged(PropTag::TagTransportMessageHeaders),
                    value,
                });
                return;
            },
            Err(e) => {
                error!("failed to decode header stream {:?}: {}", stream, e);
                properties.push_fault(PropertyFault { tag: raw.tag, error: e });
            },
        }
    }
}

/// Sub-storages whose names match `pattern`, ordered by their hex index.
fn indexed_children<'s>(storage: &'s StorageNode, pattern: &Regex) -> Vec<&'s StorageNode> {
    let mut indexed: Vec<(u32, &'s StorageNode)> = storage.children()
        .iter()
        .filter(|child| child.is_storage())
        .filter_map(|child| {
            let caps = pattern.captures(child.name())?;
            let index = u32::from_str_radix(&caps["index"], 16).ok()?;
            Some((index, child))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, child)| child).collect()
}
