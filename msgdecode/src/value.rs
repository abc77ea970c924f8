use encoding_rs::Encoding;
use log::warn;
use msox::{utf16_le_to_string, PropType, PropValue, PropertyTag};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::props_stream::RawPropertyDescriptor;
use crate::storage::{NodeKind, StorageNode};


static ELEMENT_STREAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(concat!(
    "(?i)",
    "^",
    "__substg1\\.0_",
    "(?P<tag>[0-9A-F]{8})",
    "-",
    "(?P<index>[0-9A-F]{8})",
    "$",
)).unwrap());


fn le_i16(b: &[u8]) -> i16 { i16::from_le_bytes([b[0], b[1]]) }
fn le_u16(b: &[u8]) -> u16 { u16::from_le_bytes([b[0], b[1]]) }
fn le_i32(b: &[u8]) -> i32 { i32::from_le_bytes([b[0], b[1], b[2], b[3]]) }
fn le_u32(b: &[u8]) -> u32 { u32::from_le_bytes([b[0], b[1], b[2], b[3]]) }
fn le_f32(b: &[u8]) -> f32 { f32::from_le_bytes([b[0], b[1], b[2], b[3]]) }
fn le_i64(b: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[0..8]);
    i64::from_le_bytes(buf)
}
fn le_f64(b: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[0..8]);
    f64::from_le_bytes(buf)
}
fn le_guid(b: &[u8]) -> Uuid {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&b[0..16]);
    Uuid::from_bytes_le(buf)
}


macro_rules! fixed_multiple {
    ($raw:expr, $storage:expr, $variant:ident, $width:expr, $convert:ident) => {
        {
            let chunks = fixed_multiple_chunks($raw, $storage, $width)?;
            Ok(PropValue::$variant(chunks.into_iter().map($convert).collect()))
        }
    };
}


/// Decodes one property entry into a typed value, reading its value stream
/// from `storage` when the value is not inline.
///
/// 8-bit strings are decoded with `encoding`.
pub fn decode_value(raw: &RawPropertyDescriptor, storage: &StorageNode, encoding: &'static Encoding) -> Result<PropValue, DecodeError> {
    let tag = raw.tag;
    let v = &raw.value;

    match tag.prop_type() {
        PropType::Unspecified => Ok(PropValue::Unspecified),
        PropType::Null => Ok(PropValue::Null),

        // stored inline
        PropType::Integer16 => Ok(PropValue::Integer16(le_i16(v))),
        PropType::Integer32 => Ok(PropValue::Integer32(le_i32(v))),
        PropType::Floating32 => Ok(PropValue::Floating32(le_f32(v))),
        PropType::Floating64 => Ok(PropValue::Floating64(le_f64(v))),
        PropType::Currency => Ok(PropValue::Currency(le_i64(v))),
        PropType::FloatingTime => Ok(PropValue::FloatingTime(le_f64(v))),
        PropType::ErrorCode => Ok(PropValue::ErrorCode(le_u32(v))),
        PropType::Boolean => Ok(PropValue::Boolean(le_u16(v) != 0)),
        PropType::Integer64 => Ok(PropValue::Integer64(le_i64(v))),
        PropType::Time => Ok(PropValue::Time(le_i64(v))),

        // stored externally
        PropType::String8 => {
            let bytes = value_stream(tag, storage)?;
            Ok(PropValue::String8(decode_string8(bytes, encoding)))
        },
        PropType::String => {
            let bytes = value_stream(tag, storage)?;
            Ok(PropValue::String(decode_unicode(tag, bytes)?))
        },
        PropType::Binary => {
            let bytes = value_stream(tag, storage)?;
            Ok(PropValue::Binary(bytes.to_vec()))
        },
        PropType::Guid => {
            let bytes = value_stream(tag, storage)?;
            if bytes.len() != 16 {
                return Err(DecodeError::ValueLength { tag, byte_count: bytes.len(), element_size: 16 });
            }
            Ok(PropValue::Guid(le_guid(bytes)))
        },
        PropType::Object => {
            let name = tag.stream_name();
            match storage.child(&name) {
                Some(child) if child.kind() == NodeKind::Storage
                    => Ok(PropValue::ObjectStorage(child.name().to_owned())),
                Some(child)
                    => Ok(PropValue::Object(child.data().to_vec())),
                None
                    => Err(DecodeError::MissingAuxiliaryStream { tag, stream: name }),
            }
        },

        // stored externally, fixed-width elements
        PropType::MultipleInteger16 => fixed_multiple!(raw, storage, MultipleInteger16, 2, le_i16),
        PropType::MultipleInteger32 => fixed_multiple!(raw, storage, MultipleInteger32, 4, le_i32),
        PropType::MultipleFloating32 => fixed_multiple!(raw, storage, MultipleFloating32, 4, le_f32),
        PropType::MultipleFloating64 => fixed_multiple!(raw, storage, MultipleFloating64, 8, le_f64),
        PropType::MultipleCurrency => fixed_multiple!(raw, storage, MultipleCurrency, 8, le_i64),
        PropType::MultipleFloatingTime => fixed_multiple!(raw, storage, MultipleFloatingTime, 8, le_f64),
        PropType::MultipleInteger64 => fixed_multiple!(raw, storage, MultipleInteger64, 8, le_i64),
        PropType::MultipleTime => fixed_multiple!(raw, storage, MultipleTime, 8, le_i64),
        PropType::MultipleGuid => fixed_multiple!(raw, storage, MultipleGuid, 16, le_guid),

        // stored externally, one stream per element
        PropType::MultipleString8 => {
            let elements = variable_multiple_elements(tag, storage, 4)?;
            let values = elements.into_iter()
                .map(|bytes| decode_string8(bytes, encoding))
                .collect();
            Ok(PropValue::MultipleString8(values))
        },
        PropType::MultipleString => {
            let elements = variable_multiple_elements(tag, storage, 4)?;
            let mut values = Vec::with_capacity(elements.len());
            for bytes in elements {
                values.push(decode_unicode(tag, bytes)?);
            }
            Ok(PropValue::MultipleString(values))
        },
        PropType::MultipleBinary => {
            // lengths are 8 bytes a piece but the latter 4 bytes are reserved
            let elements = variable_multiple_elements(tag, storage, 8)?;
            Ok(PropValue::MultipleBinary(elements.into_iter().map(|b| b.to_vec()).collect()))
        },

        PropType::Other(other) => {
            warn!("property {} has unknown type 0x{:04X}; keeping raw bytes", tag, other);
            let data = match storage.stream_data(&tag.stream_name()) {
                Some(bytes) => bytes.to_vec(),
                None => raw.value.to_vec(),
            };
            Ok(PropValue::Unsupported { prop_type: other, data })
        },
    }
}


fn value_stream<'s>(tag: PropertyTag, storage: &'s StorageNode) -> Result<&'s [u8], DecodeError> {
    let name = tag.stream_name();
    match storage.stream_data(&name) {
        Some(bytes) => Ok(bytes),
        None => Err(DecodeError::MissingAuxiliaryStream { tag, stream: name }),
    }
}

fn decode_string8(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (cow_string, _bad_sequences) = encoding.decode_with_bom_removal(bytes);
    cow_string.trim_end_matches('\0').to_owned()
}

fn decode_unicode(tag: PropertyTag, bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddStringLength { tag, byte_length: bytes.len() });
    }
    match utf16_le_to_string(bytes) {
        Ok(s) => Ok(s.trim_end_matches('\0').to_owned()),
        Err(_) => Err(DecodeError::InvalidString { tag }),
    }
}

/// Collects the `__substg1.0_IIIITTTT-NNNNNNNN` element streams of a
/// multi-valued property in index order. Indices must run 0, 1, 2, ...
/// without gaps.
pub fn element_streams<'s>(tag: PropertyTag, storage: &'s StorageNode) -> Result<Vec<&'s [u8]>, DecodeError> {
    let mut indexed: Vec<(u32, &'s [u8])> = Vec::new();
    for child in storage.children() {
        if child.kind() != NodeKind::Stream {
            continue;
        }
        let Some(caps) = ELEMENT_STREAM_RE.captures(child.name()) else { continue };
        let Ok(child_tag) = u32::from_str_radix(&caps["tag"], 16) else { continue };
        if child_tag != tag.to_u32() {
            continue;
        }
        let Ok(index) = u32::from_str_radix(&caps["index"], 16) else { continue };
        indexed.push((index, child.data()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    let before_dedup = indexed.len();
    indexed.dedup_by_key(|(index, _)| *index);
    if indexed.len() != before_dedup {
        warn!("multi-valued property {} has duplicate element streams; using the first of each", tag);
    }

    for (position, (index, _)) in indexed.iter().enumerate() {
        let expected = position as u32;
        if *index != expected {
            return Err(DecodeError::MissingMultiValueElement { tag, index: expected });
        }
    }
    Ok(indexed.into_iter().map(|(_, data)| data).collect())
}

fn variable_multiple_elements<'s>(tag: PropertyTag, storage: &'s StorageNode, length_record_size: usize) -> Result<Vec<&'s [u8]>, DecodeError> {
    let elements = element_streams(tag, storage)?;

    let lengths_name = tag.stream_name();
    match storage.stream_data(&lengths_name) {
        Some(lengths) => {
            if lengths.len() % length_record_size != 0 {
                return Err(DecodeError::ValueLength { tag, byte_count: lengths.len(), element_size: length_record_size });
            }
            let expected = lengths.len() / length_record_size;
            if elements.len() < expected {
                // indices are contiguous, so the first absent one is the count
                return Err(DecodeError::MissingMultiValueElement { tag, index: elements.len() as u32 });
            }
            if elements.len() > expected {
                return Err(DecodeError::MultiValueCountMismatch { tag, expected, obtained: elements.len() });
            }
        },
        None => {
            if elements.is_empty() {
                return Err(DecodeError::MissingAuxiliaryStream { tag, stream: lengths_name });
            }
        },
    }
    Ok(elements)
}

fn fixed_multiple_chunks<'s>(raw: &RawPropertyDescriptor, storage: &'s StorageNode, width: usize) -> Result<Vec<&'s [u8]>, DecodeError> {
    let tag = raw.tag;

    let elements = element_streams(tag, storage)?;
    if !elements.is_empty() {
        for element in &elements {
            if element.len() != width {
                return Err(DecodeError::ValueLength { tag, byte_count: element.len(), element_size: width });
            }
        }
        return Ok(elements);
    }

    let bytes = value_stream(tag, storage)?;
    if bytes.len() % width != 0 {
        return Err(DecodeError::ValueLength { tag, byte_count: bytes.len(), element_size: width });
    }
    Ok(bytes.chunks(width).collect())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::props_stream::PROPATTR_READABLE;
    use crate::testutil::{entry_bytes, inline_value, utf16z};
    use encoding_rs::{UTF_8, WINDOWS_1252};

    fn raw(tag: PropertyTag, value: [u8; 8]) -> RawPropertyDescriptor {
        RawPropertyDescriptor { tag, flags: PROPATTR_READABLE, value }
    }

    fn external(id: u16, prop_type: PropType) -> RawPropertyDescriptor {
        raw(PropertyTag::new(id, prop_type), entry_bytes(0))
    }

    #[test]
    fn test_inline_values() {
        let empty = StorageNode::storage("s", vec![]);
        let cases = [
            (PropType::Integer16, inline_value(&(-2i16).to_le_bytes()), PropValue::Integer16(-2)),
            (PropType::Integer32, inline_value(&1234i32.to_le_bytes()), PropValue::Integer32(1234)),
            (PropType::Floating64, inline_value(&1.5f64.to_le_bytes()), PropValue::Floating64(1.5)),
            (PropType::Currency, inline_value(&123_4500i64.to_le_bytes()), PropValue::Currency(123_4500)),
            (PropType::ErrorCode, inline_value(&0x8004_010Fu32.to_le_bytes()), PropValue::ErrorCode(0x8004_010F)),
            (PropType::Boolean, inline_value(&[0x01, 0x00]), PropValue::Boolean(true)),
            (PropType::Boolean, inline_value(&[0x00, 0x00]), PropValue::Boolean(false)),
            (PropType::Time, inline_value(&0x01D9_0000_0000_0000i64.to_le_bytes()), PropValue::Time(0x01D9_0000_0000_0000)),
        ];
        for (prop_type, bytes, expected) in cases {
            let value = decode_value(&raw(PropertyTag::new(0x6601, prop_type), bytes), &empty, UTF_8).unwrap();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_strings_and_binary() {
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_0037001E", b"Caf\xE9\0".to_vec()),
            StorageNode::stream("__substg1.0_1000001F", utf16z("Body text")),
            StorageNode::stream("__substg1.0_10090102", vec![1, 2, 3]),
        ]);
        let subject = decode_value(&external(0x0037, PropType::String8), &storage, WINDOWS_1252).unwrap();
        assert_eq!(subject, PropValue::String8("Caf\u{e9}".to_owned()));
        let body = decode_value(&external(0x1000, PropType::String), &storage, WINDOWS_1252).unwrap();
        assert_eq!(body, PropValue::String("Body text".to_owned()));
        let rtf = decode_value(&external(0x1009, PropType::Binary), &storage, WINDOWS_1252).unwrap();
        assert_eq!(rtf, PropValue::Binary(vec![1, 2, 3]));
    }

    #[test]
    fn test_odd_unicode_length() {
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_1000001F", vec![b'a', 0, b'b']),
        ]);
        assert!(matches!(
            decode_value(&external(0x1000, PropType::String), &storage, UTF_8),
            Err(DecodeError::OddStringLength { byte_length: 3, .. }),
        ));
    }

    #[test]
    fn test_missing_value_stream() {
        let storage = StorageNode::storage("s", vec![]);
        match decode_value(&external(0x0037, PropType::String), &storage, UTF_8) {
            Err(DecodeError::MissingAuxiliaryStream { stream, .. }) => assert_eq!(stream, "__substg1.0_0037001F"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_object_storage_and_stream() {
        let storage = StorageNode::storage("s", vec![
            StorageNode::storage("__substg1.0_3701000D", vec![]),
        ]);
        let value = decode_value(&external(0x3701, PropType::Object), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::ObjectStorage("__substg1.0_3701000D".to_owned()));

        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_3701000D", vec![9, 9]),
        ]);
        let value = decode_value(&external(0x3701, PropType::Object), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::Object(vec![9, 9]));
    }

    #[test]
    fn test_guid_value() {
        let guid = Uuid::from_u128(0x00062003_0000_0000_C000_000000000046);
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_66000048", guid.to_bytes_le().to_vec()),
        ]);
        let value = decode_value(&external(0x6600, PropType::Guid), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::Guid(guid));
    }

    fn mv_string_storage(indices: &[u32], declared: usize) -> StorageNode {
        let mut children = vec![StorageNode::stream("__substg1.0_3A54101F", vec![0u8; 4 * declared])];
        for index in indices {
            children.push(StorageNode::stream(
                format!("__substg1.0_3A54101F-{:08X}", index),
                utf16z(&format!("value {}", index)),
            ));
        }
        StorageNode::storage("s", children)
    }

    #[test]
    fn test_multiple_strings_in_index_order() {
        // enumeration order differs from index order
        let storage = mv_string_storage(&[2, 0, 3, 1], 4);
        let value = decode_value(&external(0x3A54, PropType::MultipleString), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::MultipleString(vec![
            "value 0".to_owned(),
            "value 1".to_owned(),
            "value 2".to_owned(),
            "value 3".to_owned(),
        ]));
    }

    #[test]
    fn test_multiple_gap_is_an_error() {
        let storage = mv_string_storage(&[0, 1, 3, 4], 5);
        match decode_value(&external(0x3A54, PropType::MultipleString), &storage, UTF_8) {
            Err(DecodeError::MissingMultiValueElement { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected a missing element, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_trailing_element_missing() {
        let storage = mv_string_storage(&[0, 1], 3);
        match decode_value(&external(0x3A54, PropType::MultipleString), &storage, UTF_8) {
            Err(DecodeError::MissingMultiValueElement { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected a missing element, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_binary() {
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_66021102", vec![0u8; 16]),
            StorageNode::stream("__substg1.0_66021102-00000000", vec![0xAA]),
            StorageNode::stream("__substg1.0_66021102-00000001", vec![0xBB, 0xCC]),
        ]);
        let value = decode_value(&external(0x6602, PropType::MultipleBinary), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::MultipleBinary(vec![vec![0xAA], vec![0xBB, 0xCC]]));
    }

    #[test]
    fn test_multiple_fixed_width_single_stream() {
        let mut packed = Vec::new();
        for v in [7i32, -1, 42] {
            packed.extend_from_slice(&v.to_le_bytes());
        }
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_66031003", packed),
        ]);
        let value = decode_value(&external(0x6603, PropType::MultipleInteger32), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::MultipleInteger32(vec![7, -1, 42]));

        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_66031003", vec![0u8; 6]),
        ]);
        assert!(matches!(
            decode_value(&external(0x6603, PropType::MultipleInteger32), &storage, UTF_8),
            Err(DecodeError::ValueLength { byte_count: 6, element_size: 4, .. }),
        ));
    }

    #[test]
    fn test_multiple_fixed_width_element_streams() {
        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_66041014-00000001", 5i64.to_le_bytes().to_vec()),
            StorageNode::stream("__substg1.0_66041014-00000000", 4i64.to_le_bytes().to_vec()),
        ]);
        let value = decode_value(&external(0x6604, PropType::MultipleInteger64), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::MultipleInteger64(vec![4, 5]));
    }

    #[test]
    fn test_unknown_type_keeps_raw_bytes() {
        let empty = StorageNode::storage("s", vec![]);
        let value = decode_value(&raw(PropertyTag { id: 0x6605, prop_type: 0x00FB }, [1, 2, 3, 4, 5, 6, 7, 8]), &empty, UTF_8).unwrap();
        assert_eq!(value, PropValue::Unsupported { prop_type: 0x00FB, data: vec![1, 2, 3, 4, 5, 6, 7, 8] });

        let storage = StorageNode::storage("s", vec![
            StorageNode::stream("__substg1.0_660500FB", vec![0xEE]),
        ]);
        let value = decode_value(&raw(PropertyTag { id: 0x6605, prop_type: 0x00FB }, entry_bytes(1)), &storage, UTF_8).unwrap();
        assert_eq!(value, PropValue::Unsupported { prop_type: 0x00FB, data: vec![0xEE] });
    }
}
