//! Error types for sound extraction.

use thiserror::Error;

/// Errors that can occur when reading sounds.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] arena2_common::Error),

    /// Archive error.
    #[error("{0}")]
    Bsa(#[from] arena2_bsa::Error),

    /// Sample data does not fit a WAV data chunk.
    #[error("sound payload of {0} bytes is too large for a WAV file")]
    PayloadTooLarge(usize),
}

/// Result type for sound operations.
pub type Result<T> = std::result::Result<T, Error>;
