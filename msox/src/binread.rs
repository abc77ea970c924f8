use std::io;
use std::string::FromUtf16Error;

use uuid::Uuid;


macro_rules! declare_read {
    ($func_name:ident, $or_eof_func_name:ident, $type:ty) => {
        fn $func_name(&mut self) -> Result<$type, io::Error>;
        fn $or_eof_func_name(&mut self) -> Result<Option<$type>, io::Error>;
    };
}
macro_rules! impl_read_le {
    ($func_name:ident, $or_eof_func_name:ident, $type:ty, $byte_count:expr) => {
        fn $func_name(&mut self) -> Result<$type, io::Error> {
            let mut buf = [0u8; $byte_count];
            self.read_exact(&mut buf)?;
            Ok(<$type>::from_le_bytes(buf))
        }

        fn $or_eof_func_name(&mut self) -> Result<Option<$type>, io::Error> {
            let mut buf = [0u8; $byte_count];

            // a clean end of data is only allowed before the first byte
            let bytes_read = self.read(&mut buf[0..1])?;
            if bytes_read == 0 {
                return Ok(None);
            }
            if $byte_count > 1 {
                self.read_exact(&mut buf[1..$byte_count])?;
            }

            Ok(Some(<$type>::from_le_bytes(buf)))
        }
    };
}


/// Little-endian primitive reads on top of [`io::Read`].
///
/// Everything in an Outlook compound message (properties streams, name-id
/// mapping streams, inline values) is little endian, so there are no
/// big-endian counterparts.
pub trait BinaryReader {
    declare_read!(read_u8, read_u8_or_eof, u8);
    declare_read!(read_u16_le, read_u16_le_or_eof, u16);
    declare_read!(read_u32_le, read_u32_le_or_eof, u32);
    declare_read!(read_u64_le, read_u64_le_or_eof, u64);
    declare_read!(read_i16_le, read_i16_le_or_eof, i16);
    declare_read!(read_i32_le, read_i32_le_or_eof, i32);
    declare_read!(read_i64_le, read_i64_le_or_eof, i64);
    declare_read!(read_f32_le, read_f32_le_or_eof, f32);
    declare_read!(read_f64_le, read_f64_le_or_eof, f64);

    /// Reads a GUID in its mixed-endian on-disk layout.
    fn read_uuid_le(&mut self) -> Result<Uuid, io::Error>;

    /// Reads `byte_count` bytes of UTF-16LE text.
    ///
    /// The outer error is an I/O error; the inner one reports unpaired
    /// surrogates.
    fn read_utf16_le(&mut self, byte_count: usize) -> Result<Result<String, FromUtf16Error>, io::Error>;

    /// Discards `byte_count` bytes.
    fn skip(&mut self, byte_count: usize) -> Result<(), io::Error>;
}

impl<R: io::Read> BinaryReader for R {
    impl_read_le!(read_u8, read_u8_or_eof, u8, 1);
    impl_read_le!(read_u16_le, read_u16_le_or_eof, u16, 2);
    impl_read_le!(read_u32_le, read_u32_le_or_eof, u32, 4);
    impl_read_le!(read_u64_le, read_u64_le_or_eof, u64, 8);
    impl_read_le!(read_i16_le, read_i16_le_or_eof, i16, 2);
    impl_read_le!(read_i32_le, read_i32_le_or_eof, i32, 4);
    impl_read_le!(read_i64_le, read_i64_le_or_eof, i64, 8);
    impl_read_le!(read_f32_le, read_f32_le_or_eof, f32, 4);
    impl_read_le!(read_f64_le, read_f64_le_or_eof, f64, 8);

    fn read_uuid_le(&mut self) -> Result<Uuid, io::Error> {
        let mut buf = [0u8; 16];
        self.read_exact(&mut buf)?;
        Ok(Uuid::from_bytes_le(buf))
    }

    fn read_utf16_le(&mut self, byte_count: usize) -> Result<Result<String, FromUtf16Error>, io::Error> {
        let mut bytes = vec![0u8; byte_count];
        self.read_exact(&mut bytes)?;
        Ok(utf16_le_to_string(&bytes))
    }

    #[inline]
    fn skip(&mut self, byte_count: usize) -> Result<(), io::Error> {
        let mut skip_buf = [0u8; 64];
        let mut remaining = byte_count;
        while remaining > 0 {
            let chunk = remaining.min(skip_buf.len());
            self.read_exact(&mut skip_buf[0..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }
}


/// Decodes UTF-16LE bytes; a trailing odd byte is ignored.
pub fn utf16_le_to_string(bytes: &[u8]) -> Result<String, FromUtf16Error> {
    let words: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&words)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_or_eof() {
        let mut cursor = Cursor::new(vec![0x34, 0x12, 0x78]);
        assert_eq!(cursor.read_u16_le_or_eof().unwrap(), Some(0x1234));
        // one byte left: not a clean end
        assert!(cursor.read_u16_le_or_eof().is_err());

        let mut empty = Cursor::new(Vec::<u8>::new());
        assert_eq!(empty.read_u32_le_or_eof().unwrap(), None);
    }

    #[test]
    fn test_read_utf16_and_skip() {
        let mut bytes = vec![0xAA, 0xBB, 0xCC];
        bytes.extend_from_slice(&[b'h', 0, b'i', 0]);
        let mut cursor = Cursor::new(bytes);
        cursor.skip(3).unwrap();
        assert_eq!(cursor.read_utf16_le(4).unwrap().unwrap(), "hi");
    }

    #[test]
    fn test_read_uuid_le() {
        let bytes = [
            0x29, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
        ];
        let mut cursor = Cursor::new(bytes);
        let guid = cursor.read_uuid_le().unwrap();
        assert_eq!(guid.to_string(), "00020329-0000-0000-c000-000000000046");
    }
}
