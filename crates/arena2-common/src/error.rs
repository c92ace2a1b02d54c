//! Error types for arena2-common.

use thiserror::Error;

/// Common error type for arena2 operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of data reached while reading.
    #[error("unexpected end of data: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write was attempted on a source opened read-only.
    #[error("byte source '{0}' is read-only")]
    ReadOnly(String),

    /// The source was used after `close()`.
    #[error("byte source '{0}' is closed")]
    Closed(String),

    /// A position lies beyond the end of the source.
    #[error("position {position} is beyond the end of the source ({len} bytes)")]
    PositionOutOfRange { position: u64, len: u64 },

    /// The requested usage/access combination is not supported.
    #[error("unsupported usage: {0}")]
    InvalidUsage(&'static str),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
