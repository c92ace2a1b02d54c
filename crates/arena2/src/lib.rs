//! arena2 - decoders for legacy ARENA2 game asset formats.
//!
//! This crate provides a unified interface to the arena2 library ecosystem.
//!
//! # Crates
//!
//! - [`arena2_common`] - Byte sources, cursors and binary reading
//! - [`arena2_bsa`] - BSA archive container (name and number directories)
//! - [`arena2_pak`] - PAK scanline run-length raster codec
//! - [`arena2_mesh`] - ARCH3D mesh decoding with UV reconstruction
//! - [`arena2_dungeon`] - Bit-packed dungeon block layouts
//! - [`arena2_sound`] - DAGGER.SND sample extraction with WAV headers
//!
//! # Example
//!
//! ```no_run
//! use arena2::prelude::*;
//!
//! let archive = BsaArchive::load("ARCH3D.BSA", SourceOptions::read_only(Usage::Mapped))?;
//! let mut meshes = MeshLibrary::new(archive);
//!
//! let mesh = meshes.decode_mesh(456)?;
//! for range in &mesh.submeshes {
//!     let (archive, record) = (range.texture_archive, range.texture_record);
//!     println!("texture {archive}:{record} - {} triangles", range.primitive_count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use arena2_bsa as bsa;
pub use arena2_common as common;
pub use arena2_dungeon as dungeon;
pub use arena2_mesh as mesh;
pub use arena2_pak as pak;
pub use arena2_sound as sound;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use arena2_bsa::{BsaArchive, BsaBuilder, BsaRecord, DirectoryType};
    pub use arena2_common::{BinaryReader, ByteSource, SourceOptions, Usage};
    pub use arena2_dungeon::{decode_dungeon_layout, DungeonBlockDescriptor, DungeonGrid};
    pub use arena2_mesh::{
        build_output_mesh, normalize_uvs, FacePolicy, MeshLibrary, NativeMesh, OutputMesh,
        TextureSizes,
    };
    pub use arena2_pak::PakRaster;
    pub use arena2_sound::{DecodedSound, SoundArchive};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
