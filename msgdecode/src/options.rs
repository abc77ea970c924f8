use codepage::to_encoding;
use encoding_rs::{Encoding, WINDOWS_1252};
use log::warn;


/// Knobs for [`decode_message_with`](crate::decode_message_with).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DecodeOptions {
    /// Windows code page for 8-bit strings when the message declares none.
    pub fallback_codepage: u16,

    /// How many levels of attached messages to decode; deeper ones are
    /// reported as faults.
    pub max_embedding_depth: usize,
}
impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_codepage(mut self, codepage: u16) -> Self {
        self.fallback_codepage = codepage;
        self
    }

    pub fn with_max_embedding_depth(mut self, depth: usize) -> Self {
        self.max_embedding_depth = depth;
        self
    }

    pub fn fallback_encoding(&self) -> &'static Encoding {
        encoding_for_codepage(self.fallback_codepage).unwrap_or(WINDOWS_1252)
    }
}
impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fallback_codepage: 1252,
            max_embedding_depth: 32,
        }
    }
}


/// Maps a Windows code page number to an encoding, `None` (with a warning)
/// if it is not one we can decode.
pub(crate) fn encoding_for_codepage(codepage: u16) -> Option<&'static Encoding> {
    let encoding = to_encoding(codepage);
    if encoding.is_none() {
        warn!("unsupported code page {}", codepage);
    }
    encoding
}


#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_8};

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.fallback_codepage, 1252);
        assert_eq!(options.max_embedding_depth, 32);
        assert_eq!(options.fallback_encoding(), WINDOWS_1252);
    }

    #[test]
    fn test_builder() {
        let options = DecodeOptions::new()
            .with_fallback_codepage(932)
            .with_max_embedding_depth(2);
        assert_eq!(options.fallback_encoding(), SHIFT_JIS);
        assert_eq!(options.max_embedding_depth, 2);
        assert_eq!(encoding_for_codepage(65001), Some(UTF_8));
    }

    #[test]
    fn test_unknown_codepage_falls_back() {
        let options = DecodeOptions::new().with_fallback_codepage(1);
        assert_eq!(options.fallback_encoding(), WINDOWS_1252);
    }
}
