//! Texture size lookup and UV normalization.

use rustc_hash::FxHashMap;

use crate::output::OutputMesh;
use crate::{Error, Result};

/// Known texture dimensions keyed by (archive, record).
#[derive(Debug, Clone, Default)]
pub struct TextureSizes {
    sizes: FxHashMap<(u16, u16), (u32, u32)>,
}

impl TextureSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, archive: u16, record: u16, width: u32, height: u32) {
        self.sizes.insert((archive, record), (width, height));
    }

    pub fn get(&self, archive: u16, record: u16) -> Option<(u32, u32)> {
        self.sizes.get(&(archive, record)).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl FromIterator<((u16, u16), (u32, u32))> for TextureSizes {
    fn from_iter<I: IntoIterator<Item = ((u16, u16), (u32, u32))>>(iter: I) -> Self {
        Self {
            sizes: iter.into_iter().collect(),
        }
    }
}

/// Divide every UV by its submesh's texture size.
///
/// All sizes are resolved before any vertex is touched, so a failure leaves
/// the mesh unchanged. Normalizing twice is a no-op.
pub fn normalize_uvs(mesh: &mut OutputMesh, sizes: &TextureSizes) -> Result<()> {
    if mesh.normalized {
        return Ok(());
    }

    let mut scales = Vec::with_capacity(mesh.submeshes.len());
    for range in &mesh.submeshes {
        let (archive, record) = (range.texture_archive, range.texture_record);
        let (width, height) = sizes
            .get(archive, record)
            .ok_or(Error::MissingTextureSize { archive, record })?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidTextureSize {
                archive,
                record,
                width,
                height,
            });
        }
        let vertices = range.first_vertex..range.first_vertex + range.vertex_count;
        scales.push((vertices, width as f32, height as f32));
    }

    for (vertices, width, height) in scales {
        for vertex in &mut mesh.vertices[vertices] {
            vertex.uv[0] /= width;
            vertex.uv[1] /= height;
        }
    }
    mesh.normalized = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputVertex, SubMeshRange};

    fn mesh() -> OutputMesh {
        let vertex = |u: f32, v: f32| OutputVertex {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [u, v],
        };
        OutputMesh {
            vertices: vec![
                vertex(64.0, 32.0),
                vertex(0.0, 0.0),
                vertex(32.0, 64.0),
                vertex(128.0, 128.0),
            ],
            indices: vec![0, 2, 1, 1, 3, 2],
            submeshes: vec![
                SubMeshRange {
                    texture_archive: 1,
                    texture_record: 0,
                    start_index: 0,
                    primitive_count: 1,
                    first_vertex: 0,
                    vertex_count: 3,
                },
                SubMeshRange {
                    texture_archive: 2,
                    texture_record: 4,
                    start_index: 3,
                    primitive_count: 1,
                    first_vertex: 3,
                    vertex_count: 1,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_per_submesh() {
        let mut mesh = mesh();
        let sizes: TextureSizes = [((1, 0), (64, 64)), ((2, 4), (256, 128))].into_iter().collect();

        normalize_uvs(&mut mesh, &sizes).unwrap();
        assert_eq!(mesh.vertices[0].uv, [1.0, 0.5]);
        assert_eq!(mesh.vertices[2].uv, [0.5, 1.0]);
        assert_eq!(mesh.vertices[3].uv, [0.5, 1.0]);

        // Second call does nothing.
        normalize_uvs(&mut mesh, &sizes).unwrap();
        assert_eq!(mesh.vertices[0].uv, [1.0, 0.5]);
    }

    #[test]
    fn test_missing_size_leaves_mesh_unchanged() {
        let mut mesh = mesh();
        let mut sizes = TextureSizes::new();
        sizes.insert(1, 0, 64, 64);

        let result = normalize_uvs(&mut mesh, &sizes);
        assert!(matches!(
            result,
            Err(Error::MissingTextureSize { archive: 2, record: 4 })
        ));
        assert_eq!(mesh.vertices[0].uv, [64.0, 32.0]);
        assert!(!mesh.normalized);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut mesh = mesh();
        let sizes: TextureSizes = [((1, 0), (0, 64)), ((2, 4), (1, 1))].into_iter().collect();
        assert!(matches!(
            normalize_uvs(&mut mesh, &sizes),
            Err(Error::InvalidTextureSize { width: 0, .. })
        ));
    }
}
