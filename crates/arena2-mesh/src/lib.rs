//! ARCH3D mesh decoding for ARENA2 game files.
//!
//! Mesh records are stored as convex polygons ("planes") over a shared point
//! list. Each plane carries a packed texture reference and texture
//! coordinates where only the first point is absolute. Decoding happens in
//! three steps:
//!
//! 1. [`NativeMesh::parse`] reads the record and groups planes by texture.
//! 2. [`build_output_mesh`] triangulates every plane as a fan, converts axes
//!    and reconstructs absolute UVs ([`uv`]).
//! 3. [`normalize_uvs`] optionally divides UVs by texture sizes.
//!
//! [`MeshLibrary`] ties the steps to an `ARCH3D.BSA` archive and caches
//! results by object id.
//!
//! # Example
//!
//! ```no_run
//! use arena2_common::{SourceOptions, Usage};
//! use arena2_mesh::MeshLibrary;
//!
//! let mut library = MeshLibrary::open("ARCH3D.BSA", SourceOptions::read_only(Usage::Mapped))?;
//! let mesh = library.decode_mesh(456)?;
//! println!("{} triangles", mesh.triangle_count());
//! # Ok::<(), arena2_mesh::Error>(())
//! ```

mod error;
pub mod fan;
mod library;
pub mod native;
pub mod obj;
mod output;
mod texture;
pub mod uv;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use fan::{fan_indices, AxisConvention};
pub use library::MeshLibrary;
pub use native::{NativeMesh, NativePlane, NativePoint, SubMesh, Version};
pub use output::{
    build_output_mesh, FacePolicy, MeshBuilder, OutputMesh, OutputVertex, SkippedFace,
    SubMeshRange,
};
pub use texture::{normalize_uvs, TextureSizes};
pub use uv::{reconstruct_uvs, UvSolver};
