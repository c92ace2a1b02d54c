//! Positioned readers and writers over a [`ByteSource`](crate::ByteSource).

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::Mutex;

use crate::source::SourceState;
use crate::text;
use crate::{Error, Result};

enum ReaderInner<'a> {
    File {
        file: &'a Mutex<File>,
        position: u64,
        len: u64,
    },
    Slice(Cursor<&'a [u8]>),
}

/// A cursor reading from a byte source.
///
/// Implements [`Read`] and [`Seek`]. Fixed-size reads fail with
/// [`Error::UnexpectedEof`] instead of returning short data.
pub struct SourceReader<'a> {
    inner: ReaderInner<'a>,
}

impl<'a> SourceReader<'a> {
    pub(crate) fn from_file(file: &'a Mutex<File>, position: u64, len: u64) -> Self {
        Self {
            inner: ReaderInner::File { file, position, len },
        }
    }

    pub(crate) fn from_slice(data: &'a [u8], position: u64) -> Self {
        let mut cursor = Cursor::new(data);
        cursor.set_position(position);
        Self {
            inner: ReaderInner::Slice(cursor),
        }
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        match &self.inner {
            ReaderInner::File { position, .. } => *position,
            ReaderInner::Slice(cursor) => cursor.position(),
        }
    }

    /// Length of the underlying source.
    pub fn len(&self) -> u64 {
        match &self.inner {
            ReaderInner::File { len, .. } => *len,
            ReaderInner::Slice(cursor) => cursor.get_ref().len() as u64,
        }
    }

    /// Check whether the underlying source is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left between the cursor and the end of the source.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    /// Move to an absolute position.
    pub fn set_position(&mut self, position: u64) {
        match &mut self.inner {
            ReaderInner::File { position: current, .. } => *current = position,
            ReaderInner::Slice(cursor) => cursor.set_position(position),
        }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if (needed as u64) > available {
            return Err(Error::UnexpectedEof {
                needed,
                available: available as usize,
            });
        }
        Ok(())
    }

    /// Read exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure(count)?;
        let mut out = vec![0u8; count];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(ReadBytesExt::read_u8(self)?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(ReadBytesExt::read_i8(self)?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(ReadBytesExt::read_u16::<LittleEndian>(self)?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(ReadBytesExt::read_i16::<LittleEndian>(self)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(ReadBytesExt::read_u32::<LittleEndian>(self)?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(ReadBytesExt::read_i32::<LittleEndian>(self)?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(ReadBytesExt::read_u64::<LittleEndian>(self)?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(ReadBytesExt::read_i64::<LittleEndian>(self)?)
    }

    /// Read a big-endian u16.
    pub fn read_be_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(ReadBytesExt::read_u16::<BigEndian>(self)?)
    }

    /// Read a big-endian i16.
    pub fn read_be_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(ReadBytesExt::read_i16::<BigEndian>(self)?)
    }

    /// Read a big-endian u32.
    pub fn read_be_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(ReadBytesExt::read_u32::<BigEndian>(self)?)
    }

    /// Read a big-endian i32.
    pub fn read_be_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(ReadBytesExt::read_i32::<BigEndian>(self)?)
    }

    /// Scan bytes up to a null or the end of the source.
    ///
    /// The null, when present, is consumed but not returned.
    fn scan_until_null(&mut self) -> Result<(Vec<u8>, bool)> {
        let mut bytes = Vec::new();
        while self.remaining() > 0 {
            match ReadBytesExt::read_u8(self)? {
                0 => return Ok((bytes, true)),
                b => bytes.push(b),
            }
        }
        Ok((bytes, false))
    }

    /// Read a null-terminated string, consuming the terminator.
    ///
    /// End of data terminates the string if no null byte is found.
    pub fn read_cstring(&mut self) -> Result<String> {
        let (bytes, _) = self.scan_until_null()?;
        Ok(text::decode_text(&bytes))
    }

    /// Read exactly `length` bytes as a string, dropping embedded nulls.
    ///
    /// Returns an empty string without moving if `length` exceeds the
    /// remaining data.
    pub fn read_fixed_string(&mut self, length: usize) -> Result<String> {
        if length as u64 > self.remaining() {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(length)?;
        Ok(text::fixed_string(&bytes, length).unwrap_or_default())
    }

    /// Read up to `max_len` bytes (`0` = unbounded) stopping at a null, then
    /// move to `start + skip`.
    ///
    /// With `max_len == 0` and no null before the end of data, the text is
    /// truncated to `skip` bytes. Out-of-range lengths yield an empty string
    /// without moving.
    pub fn read_cstring_skip(&mut self, max_len: usize, skip: usize) -> Result<String> {
        let start = self.position();
        let remaining = self.remaining();
        if skip as u64 > remaining || max_len as u64 > remaining {
            return Ok(String::new());
        }

        let text = if max_len == 0 {
            let (bytes, found) = self.scan_until_null()?;
            if found {
                text::decode_text(&bytes)
            } else {
                text::decode_text(&bytes[..skip.min(bytes.len())])
            }
        } else {
            let window = self.read_bytes(max_len)?;
            text::cstring(&window).0
        };

        self.set_position(start + skip as u64);
        Ok(text)
    }
}

impl Read for SourceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            ReaderInner::File { file, position, .. } => {
                let mut file = file.lock();
                file.seek(SeekFrom::Start(*position))?;
                let read = file.read(buf)?;
                *position += read as u64;
                Ok(read)
            }
            ReaderInner::Slice(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for SourceReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            ReaderInner::File { position, len, .. } => {
                *position = resolve_seek(*position, *len, pos)?;
                Ok(*position)
            }
            ReaderInner::Slice(cursor) => cursor.seek(pos),
        }
    }
}

fn resolve_seek(current: u64, len: u64, pos: SeekFrom) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::End(delta) => len.checked_add_signed(delta),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
    };
    target.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
    })
}

enum WriterInner<'a> {
    File(&'a mut File),
    Memory(&'a mut Vec<u8>),
}

/// A cursor writing to a byte source.
///
/// Writes past the end extend the source.
pub struct SourceWriter<'a> {
    inner: WriterInner<'a>,
    position: u64,
    state: &'a mut SourceState,
}

impl<'a> SourceWriter<'a> {
    pub(crate) fn from_file(file: &'a mut File, position: u64, state: &'a mut SourceState) -> Self {
        Self {
            inner: WriterInner::File(file),
            position,
            state,
        }
    }

    pub(crate) fn from_vec(
        data: &'a mut Vec<u8>,
        position: u64,
        state: &'a mut SourceState,
    ) -> Self {
        Self {
            inner: WriterInner::Memory(data),
            position,
            state,
        }
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(WriteBytesExt::write_u8(self, value)?)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        Ok(WriteBytesExt::write_u16::<LittleEndian>(self, value)?)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        Ok(WriteBytesExt::write_i16::<LittleEndian>(self, value)?)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        Ok(WriteBytesExt::write_u32::<LittleEndian>(self, value)?)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(WriteBytesExt::write_i32::<LittleEndian>(self, value)?)
    }
}

impl Write for SourceWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = match &mut self.inner {
            WriterInner::File(file) => {
                file.seek(SeekFrom::Start(self.position))?;
                file.write(buf)?
            }
            WriterInner::Memory(data) => {
                let start = self.position as usize;
                let end = start + buf.len();
                if end > data.len() {
                    data.resize(end, 0);
                }
                data[start..end].copy_from_slice(buf);
                buf.len()
            }
        };

        self.position += written as u64;
        self.state.len = self.state.len.max(self.position);
        self.state.dirty = true;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            WriterInner::File(file) => file.flush(),
            WriterInner::Memory(_) => Ok(()),
        }
    }
}

impl Seek for SourceWriter<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = resolve_seek(self.position, self.state.len, pos)?;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use crate::ByteSource;

    use super::*;

    #[test]
    fn test_endian_helpers() {
        let bytes = vec![0x01, 0x02, 0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFE];
        let source = ByteSource::from_bytes(bytes, "t");
        let mut reader = source.reader_at(0).unwrap();

        assert_eq!(reader.read_u16().unwrap(), 0x0201);
        assert_eq!(reader.read_be_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_be_i32().unwrap(), -2);
        assert!(matches!(reader.read_u8(), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_string_policies() {
        let mut data = b"first\0".to_vec();
        data.extend_from_slice(b"a\0b\0c");
        data.extend_from_slice(b"NAME\0\0\0\0\0\0\0\0");
        data.push(0x2A);
        let source = ByteSource::from_bytes(data, "t");
        let mut reader = source.reader_at(0).unwrap();

        assert_eq!(reader.read_cstring().unwrap(), "first");
        assert_eq!(reader.read_fixed_string(5).unwrap(), "abc");
        assert_eq!(reader.read_cstring_skip(12, 12).unwrap(), "NAME");
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
    }

    #[test]
    fn test_cstring_skip_unbounded_without_null() {
        let source = ByteSource::from_bytes(b"ABCDEFGH".to_vec(), "t");
        let mut reader = source.reader_at(0).unwrap();

        assert_eq!(reader.read_cstring_skip(0, 3).unwrap(), "ABC");
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn test_out_of_range_strings_are_empty() {
        let source = ByteSource::from_bytes(b"AB".to_vec(), "t");
        let mut reader = source.reader_at(0).unwrap();

        assert_eq!(reader.read_fixed_string(3).unwrap(), "");
        assert_eq!(reader.read_cstring_skip(0, 16).unwrap(), "");
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_writer_extends_memory_source() {
        let mut source = ByteSource::from_bytes(vec![0; 2], "t");
        {
            let mut writer = source.writer_at(2).unwrap();
            writer.write_u16(0xBEEF).unwrap();
            writer.write_i32(-1).unwrap();
        }

        assert_eq!(source.len(), 8);
        let mut reader = source.reader_at(2).unwrap();
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_i32().unwrap(), -1);
    }
}
