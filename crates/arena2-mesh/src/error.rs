//! Error types for mesh decoding.

use thiserror::Error;

/// Errors that can occur when decoding meshes.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] arena2_common::Error),

    /// Archive error.
    #[error("{0}")]
    Bsa(#[from] arena2_bsa::Error),

    /// Unknown mesh version string.
    #[error("unsupported mesh version: {0:?}")]
    InvalidVersion([u8; 4]),

    /// A header count or offset is negative.
    #[error("invalid {field} in mesh header: {value}")]
    InvalidHeaderField { field: &'static str, value: i32 },

    /// A header count reaches past the end of the record.
    #[error("{field} needs {expected} bytes, but the record has {actual}")]
    TruncatedRecord {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A plane references a point that does not exist.
    #[error("point offset {offset} resolves to index {index}, but the mesh has {count} points")]
    PointOutOfRange { offset: i32, index: usize, count: usize },

    /// A face has fewer than three points.
    #[error("face has {0} points, at least 3 are required")]
    TooFewPoints(usize),

    /// The first three points of a face are collinear or coincident, so the
    /// texture mapping cannot be solved.
    #[error("degenerate face: texture mapping cannot be solved")]
    DegenerateFace,

    /// A face failed to decode.
    #[error("plane {plane}: {source}")]
    Face {
        plane: usize,
        #[source]
        source: Box<Error>,
    },

    /// No texture size is known for a submesh.
    #[error("no size known for texture {archive}:{record}")]
    MissingTextureSize { archive: u16, record: u16 },

    /// A texture has a zero dimension.
    #[error("texture {archive}:{record} has invalid size {width}x{height}")]
    InvalidTextureSize {
        archive: u16,
        record: u16,
        width: u32,
        height: u32,
    },

    /// No record holds the requested mesh.
    #[error("mesh {0} not found")]
    MeshNotFound(u32),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, Error>;
