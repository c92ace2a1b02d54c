//! Id-addressed mesh decoding over an ARCH3D archive.

use std::path::Path;

use arena2_bsa::BsaArchive;
use arena2_common::SourceOptions;
use rustc_hash::FxHashMap;

use crate::native::NativeMesh;
use crate::output::{build_output_mesh, FacePolicy, OutputMesh};
use crate::{Error, Result};

/// Decodes meshes by object id and keeps every decoded mesh until cleared.
pub struct MeshLibrary {
    archive: BsaArchive,
    policy: FacePolicy,
    cache: FxHashMap<u32, OutputMesh>,
}

impl MeshLibrary {
    /// Open a mesh archive from disk.
    pub fn open<P: AsRef<Path>>(path: P, options: SourceOptions) -> Result<Self> {
        Ok(Self::new(BsaArchive::load(path, options)?))
    }

    pub fn new(archive: BsaArchive) -> Self {
        Self {
            archive,
            policy: FacePolicy::default(),
            cache: FxHashMap::default(),
        }
    }

    /// Set the face policy for meshes decoded from now on.
    pub fn with_policy(mut self, policy: FacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FacePolicy {
        self.policy
    }

    pub fn archive(&self) -> &BsaArchive {
        &self.archive
    }

    /// Record index holding mesh `id`: the numeric id for number
    /// directories, otherwise the record named after the id.
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.archive
            .index_of_id(id)
            .or_else(|| self.archive.index_of(&id.to_string()))
    }

    /// Parse the native record of mesh `id` without converting it.
    pub fn native_mesh(&self, id: u32) -> Result<NativeMesh> {
        let index = self.index_of(id).ok_or(Error::MeshNotFound(id))?;
        let bytes = self.archive.record_bytes(index)?;
        NativeMesh::parse(&bytes)
    }

    /// Decode mesh `id`, or return the cached result.
    pub fn decode_mesh(&mut self, id: u32) -> Result<&OutputMesh> {
        if !self.cache.contains_key(&id) {
            let native = self.native_mesh(id)?;
            let mesh = build_output_mesh(&native, self.policy)?;
            tracing::debug!(id, triangles = mesh.triangle_count(), "decoded mesh");
            self.cache.insert(id, mesh);
        }
        self.cache.get(&id).ok_or(Error::MeshNotFound(id))
    }

    /// Whether mesh `id` is cached.
    pub fn is_cached(&self, id: u32) -> bool {
        self.cache.contains_key(&id)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached mesh.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
