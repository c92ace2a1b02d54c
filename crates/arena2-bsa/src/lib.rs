//! BSA archive container for ARENA2 game files.
//!
//! A BSA file packs many records into one file: a 4-byte header, the record
//! data back to back, and a directory at the end of the file. Directories come
//! in two flavours:
//!
//! - name directories: 12-byte null-padded names (18-byte entries)
//! - number directories: 16-bit ids (8-byte entries)
//!
//! Records are addressable by index and by name; contents are read lazily.
//! [`BsaArchive::rewrite_record`] can change a record's length, rebuilding the
//! data and directory behind it.
//!
//! # Example
//!
//! ```no_run
//! use arena2_bsa::BsaArchive;
//! use arena2_common::{SourceOptions, Usage};
//!
//! let archive = BsaArchive::load("ARCH3D.BSA", SourceOptions::read_only(Usage::Mapped))?;
//!
//! for record in archive.iter() {
//!     println!("{}: {} bytes", record.name, record.size);
//! }
//!
//! if let Some(index) = archive.index_of("456") {
//!     let data = archive.record_bytes(index)?;
//! }
//! # Ok::<(), arena2_bsa::Error>(())
//! ```

mod archive;
mod builder;
mod directory;
mod error;

pub use archive::{BsaArchive, BsaRecord};
pub use builder::BsaBuilder;
pub use directory::{BsaHeader, DirectoryType, NameRecordEntry, NumberRecordEntry, NAME_LENGTH};
pub use error::{Error, Result};
