//! Error types for PAK rasters.

use thiserror::Error;

/// Errors that can occur when encoding or decoding PAK rasters.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] arena2_common::Error),

    /// Pixel buffer does not have the fixed raster size.
    #[error("raster must be {expected} bytes, got {actual}")]
    InvalidRasterSize { expected: usize, actual: usize },

    /// A row offset points outside the encoded data.
    #[error("row {row} starts at offset {offset}, beyond the {len}-byte payload")]
    InvalidRowOffset { row: usize, offset: u32, len: usize },

    /// A run is empty or runs past the end of its row.
    #[error("invalid run of {count} pixels at column {column} in row {row}")]
    InvalidRun { row: usize, column: usize, count: u16 },
}

/// Result type for PAK operations.
pub type Result<T> = std::result::Result<T, Error>;
