//! Error types for dungeon layouts.

use thiserror::Error;

/// Errors that can occur when decoding dungeon layouts.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] arena2_common::Error),

    /// The section ends before its declared block list.
    #[error("dungeon section holds {actual} bytes, {expected} required for its block list")]
    TruncatedSection { expected: usize, actual: usize },

    /// The starting block override names a block that does not exist.
    #[error("starting block override {index} out of range ({count} blocks)")]
    InvalidStartOverride { index: usize, count: usize },
}

/// Result type for dungeon operations.
pub type Result<T> = std::result::Result<T, Error>;
