//! Writing new BSA archives.

use std::fs;
use std::path::Path;

use zerocopy::IntoBytes;

use crate::directory::{
    encode_directory, BsaHeader, DirectoryEntry, DirectoryType, NameRecordEntry,
    NumberRecordEntry,
};
use crate::{Error, Result};

/// Builds a BSA archive from records.
///
/// # Example
///
/// ```
/// use arena2_bsa::{BsaArchive, BsaBuilder, DirectoryType};
///
/// let mut builder = BsaBuilder::new(DirectoryType::Name);
/// builder.add_named("HELLO.TXT", b"hello".to_vec())?;
///
/// let archive = BsaArchive::from_bytes(builder.build(), "test.bsa")?;
/// assert_eq!(archive.record_bytes(0)?, b"hello");
/// # Ok::<(), arena2_bsa::Error>(())
/// ```
#[derive(Debug)]
pub struct BsaBuilder {
    directory_type: DirectoryType,
    entries: Vec<DirectoryEntry>,
    data: Vec<Vec<u8>>,
}

impl BsaBuilder {
    /// Create an empty builder.
    pub fn new(directory_type: DirectoryType) -> Self {
        Self {
            directory_type,
            entries: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no records were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a record to a name-indexed archive.
    pub fn add_named(&mut self, name: &str, bytes: Vec<u8>) -> Result<&mut Self> {
        self.check_type(DirectoryType::Name)?;
        let entry = NameRecordEntry::new(name, record_size(&bytes)?)?;
        self.push(DirectoryEntry::Name(entry), bytes)
    }

    /// Add a record to a number-indexed archive.
    pub fn add_numbered(&mut self, id: u16, bytes: Vec<u8>) -> Result<&mut Self> {
        self.check_type(DirectoryType::Number)?;
        let entry = NumberRecordEntry {
            id,
            compressed: 0,
            size: record_size(&bytes)?,
        };
        self.push(DirectoryEntry::Number(entry), bytes)
    }

    /// Serialize the archive.
    pub fn build(&self) -> Vec<u8> {
        let header = BsaHeader {
            record_count: self.entries.len() as u16,
            directory_type: self.directory_type as u16,
        };

        let data_len: usize = self.data.iter().map(Vec::len).sum();
        let directory_len = self.entries.len() * self.directory_type.entry_size();
        let mut out = Vec::with_capacity(BsaHeader::SIZE as usize + data_len + directory_len);
        out.extend_from_slice(header.as_bytes());
        for bytes in &self.data {
            out.extend_from_slice(bytes);
        }
        out.extend_from_slice(&encode_directory(&self.entries));
        out
    }

    /// Serialize the archive to a file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.build())?;
        Ok(())
    }

    fn check_type(&self, actual: DirectoryType) -> Result<()> {
        if self.directory_type != actual {
            return Err(Error::DirectoryMismatch {
                expected: self.directory_type.label(),
                actual: actual.label(),
            });
        }
        if self.entries.len() >= u16::MAX as usize {
            return Err(Error::TooManyRecords);
        }
        Ok(())
    }

    fn push(&mut self, entry: DirectoryEntry, bytes: Vec<u8>) -> Result<&mut Self> {
        self.entries.push(entry);
        self.data.push(bytes);
        Ok(self)
    }
}

fn record_size(bytes: &[u8]) -> Result<u32> {
    u32::try_from(bytes.len()).map_err(|_| Error::RecordTooLarge(bytes.len()))
}
