use std::fmt;
use std::io;

use msox::PropertyTag;


#[derive(Debug)]
pub enum DecodeError {
    Io(io::Error),
    MissingStream { storage: String, stream: String },
    HeaderTooShort { expected: usize, obtained: usize },
    EntryArrayLength { entry_bytes: usize, entry_size: usize },
    MissingAuxiliaryStream { tag: PropertyTag, stream: String },
    MissingMultiValueElement { tag: PropertyTag, index: u32 },
    MultiValueCountMismatch { tag: PropertyTag, expected: usize, obtained: usize },
    ValueLength { tag: PropertyTag, byte_count: usize, element_size: usize },
    OddStringLength { tag: PropertyTag, byte_length: usize },
    InvalidString { tag: PropertyTag },
    NameIdStreamLength { stream: String, byte_length: usize, record_size: usize },
    EmbeddingTooDeep { depth: usize },
}
impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)
                => write!(f, "I/O error: {}", e),
            Self::MissingStream { storage, stream }
                => write!(f, "storage {:?} has no stream {:?}", storage, stream),
            Self::HeaderTooShort { expected, obtained }
                => write!(f, "properties stream too short for its header (expected {} bytes, obtained {})", expected, obtained),
            Self::EntryArrayLength { entry_bytes, entry_size }
                => write!(f, "property entry array of {} bytes is not a multiple of the entry size {}", entry_bytes, entry_size),
            Self::MissingAuxiliaryStream { tag, stream }
                => write!(f, "property {} value stream {:?} is missing", tag, stream),
            Self::MissingMultiValueElement { tag, index }
                => write!(f, "multi-valued property {} is missing element {}", tag, index),
            Self::MultiValueCountMismatch { tag, expected, obtained }
                => write!(f, "multi-valued property {} declares {} elements but {} were found", tag, expected, obtained),
            Self::ValueLength { tag, byte_count, element_size }
                => write!(f, "property {} has byte count {} not divisible by {}", tag, byte_count, element_size),
            Self::OddStringLength { tag, byte_length }
                => write!(f, "UTF-16 string property {} has odd byte count {}", tag, byte_length),
            Self::InvalidString { tag }
                => write!(f, "string property {} contains invalid data", tag),
            Self::NameIdStreamLength { stream, byte_length, record_size }
                => write!(f, "name-id stream {:?} has byte count {} not divisible by {}", stream, byte_length, record_size),
            Self::EmbeddingTooDeep { depth }
                => write!(f, "embedded message nesting exceeds the depth limit of {}", depth),
        }
    }
}
impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl From<io::Error> for DecodeError {
    fn from(value: io::Error) -> Self { Self::Io(value) }
}
