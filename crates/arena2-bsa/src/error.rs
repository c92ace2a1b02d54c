//! Error types for the BSA crate.

use thiserror::Error;

/// Errors that can occur when working with BSA archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] arena2_common::Error),

    /// Unknown directory type in the archive header.
    #[error("invalid directory type: {0:#06x}")]
    InvalidDirectoryType(u16),

    /// The directory does not fit inside the file.
    #[error("directory of {records} records needs {needed} bytes but the archive is {len} bytes")]
    DirectoryOutOfBounds { records: usize, needed: u64, len: u64 },

    /// Record data runs into the directory.
    #[error("record data ends at {data_end} but the directory starts at {directory_offset}")]
    DataOverrunsDirectory { data_end: u64, directory_offset: u64 },

    /// Record index beyond the archive's record count.
    #[error("record index {index} out of range (archive has {count} records)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Record not found by name or id.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Record contents too large for the 32-bit size field.
    #[error("record of {0} bytes exceeds the 32-bit size field")]
    RecordTooLarge(usize),

    /// Directory record count is limited to 16 bits.
    #[error("archive cannot hold more than 65535 records")]
    TooManyRecords,

    /// Record name does not fit the fixed 12-byte field.
    #[error("record name '{0}' is longer than 12 bytes")]
    NameTooLong(String),

    /// Record kind does not match the directory type.
    #[error("cannot add a {actual} record to a {expected} archive")]
    DirectoryMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type for BSA operations.
pub type Result<T> = std::result::Result<T, Error>;
