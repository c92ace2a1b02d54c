//! Slice cursor for decoding already-fetched record bytes.

use zerocopy::FromBytes;

use crate::text;
use crate::{Error, Result};

/// A cursor over a byte slice.
///
/// Multi-byte reads are little-endian unless the method name ends in `_be`.
/// Nothing is copied until a value is produced.
///
/// # Example
///
/// ```
/// use arena2_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x00, 0x10];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u16_be().unwrap(), 0x0010);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

macro_rules! read_numbers {
    ($($(#[$meta:meta])* $name:ident => $ty:ty, $from:ident;)*) => {
        $(
            $(#[$meta])*
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                self.take_array().map(<$ty>::$from)
            }
        )*
    };
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self::new_at(data, 0)
    }

    /// Start reading at `position`. A position past the end is allowed; the
    /// first read fails.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Length of the whole slice.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True when no bytes remain.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Everything after the cursor.
    #[inline]
    fn rest(&self) -> &'a [u8] {
        self.data.get(self.position..).unwrap_or_default()
    }

    /// Read `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let rest = self.rest();
        let bytes = rest.get(..count).ok_or(Error::UnexpectedEof {
            needed: count,
            available: rest.len(),
        })?;
        self.position += count;
        Ok(bytes)
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    read_numbers! {
        read_u8 => u8, from_le_bytes;
        read_i8 => i8, from_le_bytes;
        read_u16 => u16, from_le_bytes;
        read_i16 => i16, from_le_bytes;
        read_u32 => u32, from_le_bytes;
        read_i32 => i32, from_le_bytes;
        /// Big-endian.
        read_u16_be => u16, from_be_bytes;
        /// Big-endian.
        read_i16_be => i16, from_be_bytes;
        /// Big-endian.
        read_u32_be => u32, from_be_bytes;
        /// Big-endian.
        read_i32_be => i32, from_be_bytes;
    }

    /// Read a null-terminated string, consuming the terminator.
    ///
    /// End of data terminates the string if no null byte is found.
    pub fn read_cstring(&mut self) -> String {
        let (text, consumed) = text::cstring(self.rest());
        self.position += consumed;
        text
    }

    /// Read exactly `length` bytes as a string, dropping embedded nulls.
    ///
    /// Returns an empty string without advancing if `length` exceeds the
    /// remaining data.
    pub fn read_fixed_string(&mut self, length: usize) -> String {
        match text::fixed_string(self.rest(), length) {
            Some(text) => {
                self.position += length;
                text
            }
            None => String::new(),
        }
    }

    /// Read up to `max_len` bytes stopping at a null, then move to
    /// `start + skip`.
    ///
    /// Out-of-range lengths yield an empty string without advancing.
    pub fn read_cstring_skip(&mut self, max_len: usize, skip: usize) -> String {
        match text::cstring_skip(self.rest(), max_len, skip) {
            Some(text) => {
                self.position += skip;
                text
            }
            None => String::new(),
        }
    }

    /// Read a fixed-layout struct.
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0xFF, 0xFE, 0x80];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32().unwrap(), 0x04030201);
        assert_eq!(reader.read_i16().unwrap(), -257);
        assert_eq!(reader.read_i8().unwrap(), -128);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_big_endian_reverses_byte_order() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xFF, 0xFE];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32_be().unwrap(), 0x12345678);
        assert_eq!(reader.read_i16_be().unwrap(), -2);
    }

    #[test]
    fn test_read_cstring() {
        let data = b"hello\0world";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_cstring(), "hello");
        assert_eq!(reader.read_cstring(), "world");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_fixed_string_past_end_is_empty() {
        let data = b"abc";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_fixed_string(4), "");
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_fixed_string(3), "abc");
    }

    #[test]
    fn test_cstring_skip_repositions() {
        let data = b"AB\0\0\0\0\0\0\0\0\0\0\x07";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_cstring_skip(12, 12), "AB");
        assert_eq!(reader.position(), 12);
        assert_eq!(reader.read_u8().unwrap(), 7);
    }

    #[test]
    fn test_start_past_end() {
        let mut reader = BinaryReader::new_at(b"ab", 5);
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(
            reader.read_u8(),
            Err(Error::UnexpectedEof { needed: 1, available: 0 })
        ));
        assert_eq!(reader.read_cstring(), "");
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        assert!(matches!(
            reader.read_u32(),
            Err(Error::UnexpectedEof { needed: 4, available: 2 })
        ));
    }
}
