//! Conversion of native meshes into indexed triangle lists.

use crate::fan::{fan_indices, AxisConvention};
use crate::native::{NativeMesh, NativePlane};
use crate::uv::reconstruct_uvs;
use crate::{Error, Result};

/// A vertex of the output mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Absolute texture coordinate, in texels until normalized.
    pub uv: [f32; 2],
}

/// The slice of the index buffer drawn with one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubMeshRange {
    pub texture_archive: u16,
    pub texture_record: u16,
    /// First index in [`OutputMesh::indices`].
    pub start_index: usize,
    /// Number of triangles.
    pub primitive_count: usize,
    pub first_vertex: usize,
    pub vertex_count: usize,
}

impl SubMeshRange {
    /// Index buffer range of this submesh.
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.primitive_count * 3
    }
}

/// A face dropped by [`FacePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedFace {
    /// Index of the plane in the native record.
    pub plane: usize,
    pub reason: String,
}

/// What to do when a single face cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacePolicy {
    /// Drop the face, record it in [`OutputMesh::skipped_faces`] and continue.
    #[default]
    Skip,
    /// Abort the whole mesh.
    Fail,
}

/// An indexed triangle mesh grouped by texture.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputMesh {
    pub vertices: Vec<OutputVertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMeshRange>,
    pub skipped_faces: Vec<SkippedFace>,
    /// True once UVs have been divided by texture sizes.
    pub normalized: bool,
}

impl OutputMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Incremental builder for [`OutputMesh`].
#[derive(Debug)]
pub struct MeshBuilder {
    policy: FacePolicy,
    axes: AxisConvention,
    mesh: OutputMesh,
    current: Option<SubMeshRange>,
}

impl MeshBuilder {
    pub fn new(policy: FacePolicy) -> Self {
        Self {
            policy,
            axes: AxisConvention::default(),
            mesh: OutputMesh::default(),
            current: None,
        }
    }

    /// Start a new texture group. The previous one is closed.
    pub fn begin_submesh(&mut self, texture_archive: u16, texture_record: u16) {
        self.end_submesh();
        self.current = Some(SubMeshRange {
            texture_archive,
            texture_record,
            start_index: self.mesh.indices.len(),
            primitive_count: 0,
            first_vertex: self.mesh.vertices.len(),
            vertex_count: 0,
        });
    }

    /// Append one plane to the current texture group.
    ///
    /// Under [`FacePolicy::Skip`] a failed plane is recorded and `Ok` is
    /// returned; under [`FacePolicy::Fail`] the error is returned.
    pub fn add_plane(&mut self, plane: &NativePlane) -> Result<()> {
        let vertices = match plane_vertices(plane, self.axes) {
            Ok(vertices) => vertices,
            Err(err) => {
                return match self.policy {
                    FacePolicy::Fail => Err(Error::Face {
                        plane: plane.index,
                        source: Box::new(err),
                    }),
                    FacePolicy::Skip => {
                        tracing::warn!(plane = plane.index, error = %err, "skipping face");
                        self.mesh.skipped_faces.push(SkippedFace {
                            plane: plane.index,
                            reason: err.to_string(),
                        });
                        Ok(())
                    }
                };
            }
        };

        let base = self.mesh.vertices.len() as u32;
        let local = fan_indices(vertices.len());
        let triangles = local.len() / 3;
        self.mesh.indices.extend(local.into_iter().map(|i| base + i));
        self.mesh.vertices.extend(vertices);

        if let Some(current) = self.current.as_mut() {
            current.primitive_count += triangles;
        }
        Ok(())
    }

    fn end_submesh(&mut self) {
        if let Some(mut range) = self.current.take() {
            range.vertex_count = self.mesh.vertices.len() - range.first_vertex;
            // Groups whose every face was skipped draw nothing.
            if range.primitive_count > 0 {
                self.mesh.submeshes.push(range);
            }
        }
    }

    pub fn finish(mut self) -> OutputMesh {
        self.end_submesh();
        self.mesh
    }
}

fn plane_vertices(plane: &NativePlane, axes: AxisConvention) -> Result<Vec<OutputVertex>> {
    let positions: Vec<[f32; 3]> = plane.points.iter().map(|p| p.position).collect();
    let stored: Vec<[i16; 2]> = plane.points.iter().map(|p| p.uv).collect();
    let uvs = reconstruct_uvs(&positions, &stored)?;

    Ok(plane
        .points
        .iter()
        .zip(uvs)
        .map(|(point, uv)| OutputVertex {
            position: axes.convert(point.position),
            normal: axes.convert(point.normal),
            uv,
        })
        .collect())
}

/// Convert a native mesh into an indexed triangle list.
pub fn build_output_mesh(native: &NativeMesh, policy: FacePolicy) -> Result<OutputMesh> {
    let mut builder = MeshBuilder::new(policy);
    for submesh in &native.submeshes {
        builder.begin_submesh(submesh.texture_archive, submesh.texture_record);
        for plane in &submesh.planes {
            builder.add_plane(plane)?;
        }
    }

    let mesh = builder.finish();
    tracing::debug!(
        vertices = mesh.vertices.len(),
        triangles = mesh.triangle_count(),
        submeshes = mesh.submeshes.len(),
        skipped = mesh.skipped_faces.len(),
        "built mesh"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::Version;
    use crate::testing::{MeshRecordWriter, TestPlane};

    /// A cube-ish record: one quad and one triangle on texture 5:2, one quad on
    /// texture 6:0, and a collinear quad on texture 7:1.
    fn sample() -> NativeMesh {
        let mut w = MeshRecordWriter::new(Version::V2_7);
        let a = w.point([0, 0, 0]);
        let b = w.point([256, 0, 0]);
        let c = w.point([256, 256, 0]);
        let d = w.point([0, 256, 0]);
        let e = w.point([512, 0, 0]);
        let f = w.point([768, 0, 0]);

        let quad = [(a, [0, 0]), (b, [64, 0]), (c, [0, 64]), (d, [0, 0])];
        w.plane(TestPlane::new(5, 2, [0, 0, 256]).with_points(&quad));
        w.plane(TestPlane::new(6, 0, [0, 0, 256]).with_points(&quad));
        w.plane(TestPlane::new(5, 2, [0, 0, 256]).with_points(&[
            (a, [0, 0]),
            (c, [64, 64]),
            (d, [-64, 0]),
        ]));
        w.plane(TestPlane::new(7, 1, [0, 0, 256]).with_points(&[
            (a, [0, 0]),
            (b, [1, 0]),
            (e, [1, 0]),
            (f, [0, 0]),
        ]));

        NativeMesh::parse(&w.build()).unwrap()
    }

    #[test]
    fn test_index_counts() {
        let mesh = build_output_mesh(&sample(), FacePolicy::Skip).unwrap();

        // 2 + 1 + 2 triangles emitted, the collinear quad skipped.
        assert_eq!(mesh.indices.len(), 3 * 5);
        assert_eq!(mesh.vertices.len(), 4 + 3 + 4);
        assert_eq!(mesh.skipped_faces.len(), 1);
        assert_eq!(mesh.skipped_faces[0].plane, 3);

        assert_eq!(mesh.submeshes.len(), 2);
        let first = mesh.submeshes[0];
        assert_eq!((first.texture_archive, first.texture_record), (5, 2));
        assert_eq!(first.start_index, 0);
        assert_eq!(first.primitive_count, 3);
        assert_eq!(first.first_vertex, 0);
        assert_eq!(first.vertex_count, 7);

        let second = mesh.submeshes[1];
        assert_eq!(second.start_index, 9);
        assert_eq!(second.primitive_count, 2);
        assert_eq!(second.first_vertex, 7);
        assert_eq!(second.vertex_count, 4);

        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_fan_order_and_offsets() {
        let mesh = build_output_mesh(&sample(), FacePolicy::Skip).unwrap();
        assert_eq!(&mesh.indices[0..6], &[0, 2, 1, 0, 3, 2]);
        // The triangle follows the first quad's four vertices.
        assert_eq!(&mesh.indices[6..9], &[4, 6, 5]);
    }

    #[test]
    fn test_axes_and_uvs() {
        let mesh = build_output_mesh(&sample(), FacePolicy::Skip).unwrap();
        let v = &mesh.vertices;

        assert_eq!(v[2].position, [256.0, -256.0, -0.0]);
        assert_eq!(v[0].normal, [0.0, -0.0, -1.0]);

        assert_eq!(v[0].uv, [0.0, 0.0]);
        assert_eq!(v[1].uv, [64.0, 0.0]);
        assert_eq!(v[2].uv, [64.0, 64.0]);
        // Point 3 lies at (0, 256): the map sends x to U and y to V.
        assert!((v[3].uv[0] - 0.0).abs() < 1e-3);
        assert!((v[3].uv[1] - 64.0).abs() < 1e-3);
    }

    #[test]
    fn test_fail_policy() {
        let result = build_output_mesh(&sample(), FacePolicy::Fail);
        match result {
            Err(Error::Face { plane, source }) => {
                assert_eq!(plane, 3);
                assert!(matches!(*source, Error::DegenerateFace));
            }
            other => panic!("expected face error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_faces_skipped_drops_group() {
        let mut w = MeshRecordWriter::new(Version::V2_7);
        let a = w.point([0, 0, 0]);
        let b = w.point([1, 0, 0]);
        let c = w.point([2, 0, 0]);
        let d = w.point([3, 0, 0]);
        w.plane(TestPlane::new(1, 1, [0, 0, 0]).with_points(&[
            (a, [0, 0]),
            (b, [0, 0]),
            (c, [0, 0]),
            (d, [0, 0]),
        ]));

        let native = NativeMesh::parse(&w.build()).unwrap();
        let mesh = build_output_mesh(&native, FacePolicy::Skip).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.submeshes.is_empty());
        assert_eq!(mesh.skipped_faces.len(), 1);
    }

    #[test]
    fn test_collinear_triangle_is_skipped() {
        let mut w = MeshRecordWriter::new(Version::V2_7);
        let a = w.point([0, 0, 0]);
        let b = w.point([256, 0, 0]);
        let c = w.point([512, 0, 0]);
        let d = w.point([0, 256, 0]);
        w.plane(TestPlane::new(2, 0, [0, 0, 256]).with_points(&[
            (a, [0, 0]),
            (b, [64, 0]),
            (c, [64, 0]),
        ]));
        w.plane(TestPlane::new(2, 0, [0, 0, 256]).with_points(&[
            (a, [0, 0]),
            (b, [64, 0]),
            (d, [-64, 64]),
        ]));

        let native = NativeMesh::parse(&w.build()).unwrap();
        let mesh = build_output_mesh(&native, FacePolicy::Skip).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.skipped_faces.len(), 1);
        assert_eq!(mesh.skipped_faces[0].plane, 0);
        assert!(mesh.skipped_faces[0].reason.starts_with("degenerate face"));

        assert!(matches!(
            build_output_mesh(&native, FacePolicy::Fail),
            Err(Error::Face { plane: 0, .. })
        ));
    }
}
