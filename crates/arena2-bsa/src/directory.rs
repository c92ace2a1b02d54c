//! BSA header and directory structures.
//!
//! A BSA file is laid out as:
//!
//! ```text
//! 0        BsaHeader (record count, directory type)
//! 4        record data, concatenated in directory order
//! EOF - n  directory: one entry per record
//! ```
//!
//! Record offsets are not stored; they are the running sum of record sizes
//! starting right after the header.

use arena2_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Length of the fixed name field in name directories.
pub const NAME_LENGTH: usize = 12;

/// Archive header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BsaHeader {
    /// Number of records in the directory.
    pub record_count: u16,
    /// Directory type (see [`DirectoryType`]).
    pub directory_type: u16,
}

impl BsaHeader {
    /// Header size in bytes; the first record starts here.
    pub const SIZE: u64 = 4;
}

/// Directory entry of a name-indexed archive.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct NameRecordEntry {
    /// Null-padded record name.
    pub name: [u8; NAME_LENGTH],
    /// Non-zero when the record is compressed.
    pub compressed: u16,
    /// Record size in bytes.
    pub size: u32,
}

impl NameRecordEntry {
    /// Entry size in bytes.
    pub const SIZE: usize = 18;

    /// Decode the name field.
    pub fn name(&self) -> String {
        let name = self.name;
        BinaryReader::new(&name).read_cstring_skip(NAME_LENGTH, NAME_LENGTH)
    }

    /// Build an entry, null-padding the name.
    pub fn new(name: &str, size: u32) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > NAME_LENGTH {
            return Err(Error::NameTooLong(name.to_string()));
        }

        let mut field = [0u8; NAME_LENGTH];
        field[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            name: field,
            compressed: 0,
            size,
        })
    }
}

/// Directory entry of a number-indexed archive.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct NumberRecordEntry {
    /// Record id.
    pub id: u16,
    /// Non-zero when the record is compressed.
    pub compressed: u16,
    /// Record size in bytes.
    pub size: u32,
}

impl NumberRecordEntry {
    /// Entry size in bytes.
    pub const SIZE: usize = 8;
}

/// How records are identified in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum DirectoryType {
    /// Records carry a 12-byte name.
    Name = 0x0100,
    /// Records carry a numeric id.
    Number = 0x0200,
}

impl DirectoryType {
    /// Size of one directory entry.
    pub const fn entry_size(self) -> usize {
        match self {
            DirectoryType::Name => NameRecordEntry::SIZE,
            DirectoryType::Number => NumberRecordEntry::SIZE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DirectoryType::Name => "name",
            DirectoryType::Number => "number",
        }
    }
}

impl TryFrom<u16> for DirectoryType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0x0100 => Ok(Self::Name),
            0x0200 => Ok(Self::Number),
            other => Err(Error::InvalidDirectoryType(other)),
        }
    }
}

/// A raw directory entry, kept so the directory can be re-emitted verbatim.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DirectoryEntry {
    Name(NameRecordEntry),
    Number(NumberRecordEntry),
}

impl DirectoryEntry {
    pub(crate) fn size(&self) -> u32 {
        match self {
            DirectoryEntry::Name(entry) => entry.size,
            DirectoryEntry::Number(entry) => entry.size,
        }
    }

    pub(crate) fn set_size(&mut self, size: u32) {
        match self {
            DirectoryEntry::Name(entry) => entry.size = size,
            DirectoryEntry::Number(entry) => entry.size = size,
        }
    }

    pub(crate) fn is_compressed(&self) -> bool {
        match self {
            DirectoryEntry::Name(entry) => entry.compressed != 0,
            DirectoryEntry::Number(entry) => entry.compressed != 0,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            DirectoryEntry::Name(entry) => entry.as_bytes(),
            DirectoryEntry::Number(entry) => entry.as_bytes(),
        }
    }
}

/// Parse `count` directory entries.
pub(crate) fn parse_directory(
    data: &[u8],
    count: usize,
    directory_type: DirectoryType,
) -> Result<Vec<DirectoryEntry>> {
    let mut reader = BinaryReader::new(data);
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {
        let entry = match directory_type {
            DirectoryType::Name => DirectoryEntry::Name(reader.read_struct()?),
            DirectoryType::Number => DirectoryEntry::Number(reader.read_struct()?),
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// Serialize directory entries in order.
pub(crate) fn encode_directory(entries: &[DirectoryEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * NameRecordEntry::SIZE);
    for entry in entries {
        out.extend_from_slice(entry.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_sizes_match_layout() {
        assert_eq!(std::mem::size_of::<BsaHeader>() as u64, BsaHeader::SIZE);
        assert_eq!(std::mem::size_of::<NameRecordEntry>(), NameRecordEntry::SIZE);
        assert_eq!(std::mem::size_of::<NumberRecordEntry>(), NumberRecordEntry::SIZE);
    }

    #[test]
    fn test_name_entry_round_trip() {
        let entry = NameRecordEntry::new("TEXTURE.000", 42).unwrap();
        assert_eq!(entry.name(), "TEXTURE.000");
        assert_eq!({ entry.size }, 42);

        assert!(matches!(
            NameRecordEntry::new("THIRTEEN.CHRS", 0),
            Err(Error::NameTooLong(_))
        ));
    }

    #[test]
    fn test_directory_type_from_u16() {
        assert_eq!(DirectoryType::try_from(0x0100).unwrap(), DirectoryType::Name);
        assert_eq!(DirectoryType::try_from(0x0200).unwrap(), DirectoryType::Number);
        assert!(DirectoryType::try_from(0x0300).is_err());
    }
}
