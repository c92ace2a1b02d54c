//! Common utilities for arena2.
//!
//! This crate provides the byte-level foundation shared by every format crate:
//!
//! - [`ByteSource`] - Disk, memory-mapped or in-memory binary resources behind
//!   one read/write interface
//! - [`SourceReader`] / [`SourceWriter`] - Positioned cursors with little- and
//!   big-endian primitives and the legacy string reading policies
//! - [`BinaryReader`] - Zero-copy reading from already-fetched record bytes

mod cursor;
mod error;
mod reader;
mod source;
mod text;

pub use cursor::{SourceReader, SourceWriter};
pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use source::{ByteSource, SourceOptions, Usage};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
