mod binread;
pub mod catalog;
mod prop_enums;


use std::fmt;

use from_to_repr::from_to_other;
use uuid::Uuid;

pub use crate::binread::{utf16_le_to_string, BinaryReader};
pub use crate::prop_enums::PropTag;


/// Bit set in a value-type code when the property holds an array.
pub const MULTIPLE_FLAG: u16 = 0x1000;

/// First property id of the named-property range.
pub const NAMED_PROPERTY_MIN: u16 = 0x8000;

/// Last property id of the named-property range (0xFFFF is PROP_ID_INVALID).
pub const NAMED_PROPERTY_MAX: u16 = 0xFFFE;

/// Prefix of the stream holding a property value outside the properties stream.
pub const SUBSTORAGE_PREFIX: &str = "__substg1.0_";


/// The type of an Exchange property.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum PropType {
    Unspecified = 0x0000,
    Null = 0x0001,
    Integer16 = 0x0002,
    Integer32 = 0x0003,
    Floating32 = 0x0004,
    Floating64 = 0x0005,
    Currency = 0x0006,
    FloatingTime = 0x0007,
    ErrorCode = 0x000A,
    Boolean = 0x000B,
    Object = 0x000D,
    Integer64 = 0x0014,
    String8 = 0x001E,
    String = 0x001F,
    Time = 0x0040,
    Guid = 0x0048,
    Binary = 0x0102,
    MultipleInteger16 = 0x1002,
    MultipleInteger32 = 0x1003,
    MultipleFloating32 = 0x1004,
    MultipleFloating64 = 0x1005,
    MultipleCurrency = 0x1006,
    MultipleFloatingTime = 0x1007,
    MultipleInteger64 = 0x1014,
    MultipleString8 = 0x101E,
    MultipleString = 0x101F,
    MultipleTime = 0x1040,
    MultipleGuid = 0x1048,
    MultipleBinary = 0x1102,
    Other(u16),
}
impl PropType {
    /// Whether the multi-value flag is set in the type code.
    pub fn is_multiple(&self) -> bool {
        u16::from(*self) & MULTIPLE_FLAG != 0
    }

    /// The single-valued type underlying a multi-valued one.
    pub fn element_type(&self) -> PropType {
        PropType::from_base_type(u16::from(*self) & !MULTIPLE_FLAG)
    }

    /// Byte width of a single element of a fixed-width type; `None` for
    /// variable-length, object and unknown types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self.element_type() {
            PropType::Unspecified|PropType::Null => Some(0),
            PropType::Integer16|PropType::Boolean => Some(2),
            PropType::Integer32|PropType::Floating32|PropType::ErrorCode => Some(4),
            PropType::Floating64|PropType::Currency|PropType::FloatingTime
                |PropType::Integer64|PropType::Time => Some(8),
            PropType::Guid => Some(16),
            _ => None,
        }
    }

    /// Whether a properties-stream entry of this type carries its value in
    /// its own eight value bytes. Everything else lives in a `__substg1.0_`
    /// stream or storage.
    pub fn is_inline(&self) -> bool {
        if self.is_multiple() {
            return false;
        }
        match self.fixed_width() {
            Some(width) => width <= 8,
            None => false,
        }
    }

    /// Whether this is a type code the decoder knows how to interpret.
    pub fn is_known(&self) -> bool {
        !matches!(self, PropType::Other(_))
    }
}


/// A property id together with its value type, as found in a properties
/// stream entry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PropertyTag {
    pub id: u16,
    pub prop_type: u16,
}
impl PropertyTag {
    pub fn new(id: u16, prop_type: PropType) -> Self {
        Self { id, prop_type: prop_type.into() }
    }

    /// Splits a 32-bit tag (id in the high word, type in the low word).
    pub fn from_u32(tag: u32) -> Self {
        Self {
            id: (tag >> 16) as u16,
            prop_type: (tag & 0xFFFF) as u16,
        }
    }

    pub fn to_u32(&self) -> u32 {
        (u32::from(self.id) << 16) | u32::from(self.prop_type)
    }

    pub fn prop_type(&self) -> PropType {
        PropType::from_base_type(self.prop_type)
    }

    /// Whether the id falls in the range that is resolved through the
    /// name-id mapping.
    pub fn is_named(&self) -> bool {
        self.id >= NAMED_PROPERTY_MIN && self.id <= NAMED_PROPERTY_MAX
    }

    /// Name of the stream holding this property's value, e.g.
    /// `__substg1.0_0037001F`.
    pub fn stream_name(&self) -> String {
        format!("{}{:04X}{:04X}", SUBSTORAGE_PREFIX, self.id, self.prop_type)
    }

    /// Name of the stream holding element `index` of a multi-valued
    /// property, e.g. `__substg1.0_3A54101F-00000002`.
    pub fn element_stream_name(&self, index: u32) -> String {
        format!("{}-{:08X}", self.stream_name(), index)
    }
}
impl fmt::Display for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}{:04X}", self.id, self.prop_type)
    }
}


/// The value of an Exchange property.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum PropValue {
    Unspecified,
    Null,
    Integer16(i16),
    Integer32(i32),
    Floating32(f32),
    Floating64(f64),
    Currency(i64),
    FloatingTime(f64),
    ErrorCode(u32),
    Boolean(bool),
    /// Object data stored as a stream.
    Object(Vec<u8>),
    /// Object stored as a sub-storage (e.g. an embedded message); holds the
    /// sub-storage's name.
    ObjectStorage(String),
    Integer64(i64),
    String8(String),
    String(String),
    /// FILETIME: 100 ns intervals since 1601-01-01 UTC.
    Time(i64),
    Guid(Uuid),
    Binary(Vec<u8>),
    MultipleInteger16(Vec<i16>),
    MultipleInteger32(Vec<i32>),
    MultipleFloating32(Vec<f32>),
    MultipleFloating64(Vec<f64>),
    MultipleCurrency(Vec<i64>),
    MultipleFloatingTime(Vec<f64>),
    MultipleInteger64(Vec<i64>),
    MultipleString8(Vec<String>),
    MultipleString(Vec<String>),
    MultipleTime(Vec<i64>),
    MultipleGuid(Vec<Uuid>),
    MultipleBinary(Vec<Vec<u8>>),
    /// A type code outside the known set; carries the raw bytes (stream
    /// contents if there was a stream, otherwise the inline value bytes).
    Unsupported { prop_type: u16, data: Vec<u8> },
}
impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s)|Self::String8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::MultipleString(v)|Self::MultipleString8(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Integer value widened to `i64`, for the integer types that hold
    /// enumerations and counts.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer16(v) => Some((*v).into()),
            Self::Integer32(v) => Some((*v).into()),
            Self::Integer64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b)|Self::Object(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_filetime(&self) -> Option<i64> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_floating(&self) -> Option<f64> {
        match self {
            Self::Floating32(v) => Some((*v).into()),
            Self::Floating64(v)|Self::FloatingTime(v) => Some(*v),
            _ => None,
        }
    }
}


/// The discriminator of a named property within its property set.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PropertyNameInfo {
    /// Numeric name (LID / dispatch id).
    DisplayId(u32),
    Name(String),
}
impl fmt::Display for PropertyNameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisplayId(id) => write!(f, "0x{:08X}", id),
            Self::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// A property identified by property-set GUID plus name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NamedProperty {
    pub property_set: Uuid,
    pub name: PropertyNameInfo,
}
impl NamedProperty {
    pub fn with_id(property_set: Uuid, id: u32) -> Self {
        Self { property_set, name: PropertyNameInfo::DisplayId(id) }
    }

    pub fn with_name<S: Into<String>>(property_set: Uuid, name: S) -> Self {
        Self { property_set, name: PropertyNameInfo::Name(name.into()) }
    }
}
impl fmt::Display for NamedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}:{}", self.property_set, self.name)
    }
}


/// Well-known property set GUIDs.
pub mod property_sets {
    use uuid::Uuid;

    pub const PS_MAPI: Uuid = Uuid::from_u128(0x00020328_0000_0000_C000_000000000046);
    pub const PS_PUBLIC_STRINGS: Uuid = Uuid::from_u128(0x00020329_0000_0000_C000_000000000046);
    pub const PS_INTERNET_HEADERS: Uuid = Uuid::from_u128(0x00020386_0000_0000_C000_000000000046);
    pub const PSETID_APPOINTMENT: Uuid = Uuid::from_u128(0x00062002_0000_0000_C000_000000000046);
    pub const PSETID_TASK: Uuid = Uuid::from_u128(0x00062003_0000_0000_C000_000000000046);
    pub const PSETID_ADDRESS: Uuid = Uuid::from_u128(0x00062004_0000_0000_C000_000000000046);
    pub const PSETID_COMMON: Uuid = Uuid::from_u128(0x00062008_0000_0000_C000_000000000046);
    pub const PSETID_MEETING: Uuid = Uuid::from_u128(0x6ED8DA90_450B_101B_98DA_00AA003F1305);
}
