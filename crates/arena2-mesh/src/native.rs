//! Native ARCH3D mesh records.
//!
//! Record layout (little-endian):
//!
//! ```text
//! 0    Arch3dHeader (64 bytes)
//! ...  point list:  point_count × (i32 x, i32 y, i32 z)
//! ...  normal list: plane_count × (i32 x, i32 y, i32 z), fixed point / 256
//! ...  plane list:  plane_count × (PlaneHeader, point_count × PlanePoint)
//! ```
//!
//! Plane points reference the point list by byte offset. Texture coordinates
//! after the first point of a plane are deltas (see [`crate::uv`]).

use arena2_common::BinaryReader;
use rustc_hash::FxHashMap;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Scale of the fixed-point normal list.
pub const NORMAL_SCALE: f32 = 256.0;

/// Mesh record header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Arch3dHeader {
    /// Version string, e.g. `v2.7`.
    pub version: [u8; 4],
    pub point_count: i32,
    pub plane_count: i32,
    /// Bounding radius in native units.
    pub radius: u32,
    pub null1: u64,
    pub plane_data_offset: i32,
    pub object_data_offset: i32,
    pub object_data_count: i32,
    pub unknown1: u32,
    pub null2: u64,
    pub point_list_offset: i32,
    pub normal_list_offset: i32,
    pub unknown2: u32,
    pub plane_list_offset: i32,
}

impl Arch3dHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 64;
}

/// Fixed part of a plane entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PlaneHeader {
    pub point_count: u8,
    pub unknown1: u8,
    /// Packed texture archive (high 9 bits) and record (low 7 bits).
    pub texture: u16,
    pub unknown2: u32,
}

/// One point reference of a plane entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PlanePoint {
    /// Byte offset into the point list.
    pub offset: i32,
    pub u: i16,
    pub v: i16,
}

/// Mesh format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V2_5,
    V2_6,
    V2_7,
}

impl Version {
    /// Divisor turning a plane point offset into a point index.
    pub const fn point_divisor(self) -> i32 {
        match self {
            Version::V2_7 => 12,
            Version::V2_5 | Version::V2_6 => 4,
        }
    }

    pub const fn magic(self) -> [u8; 4] {
        match self {
            Version::V2_5 => *b"v2.5",
            Version::V2_6 => *b"v2.6",
            Version::V2_7 => *b"v2.7",
        }
    }
}

impl TryFrom<[u8; 4]> for Version {
    type Error = Error;

    fn try_from(value: [u8; 4]) -> Result<Self> {
        match &value {
            b"v2.5" => Ok(Version::V2_5),
            b"v2.6" => Ok(Version::V2_6),
            b"v2.7" => Ok(Version::V2_7),
            _ => Err(Error::InvalidVersion(value)),
        }
    }
}

/// Split a packed texture word into (archive, record).
#[inline]
pub const fn split_texture(texture: u16) -> (u16, u16) {
    (texture >> 7, texture & 0x7F)
}

/// A mesh vertex in native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativePoint {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Texture coordinate; absolute for the first point of a plane, a delta
    /// for the others.
    pub uv: [i16; 2],
}

/// A convex polygon, triangulated as a fan from its first point.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePlane {
    /// Position of the plane in the record's plane list.
    pub index: usize,
    /// Packed texture word.
    pub texture: u16,
    pub points: Vec<NativePoint>,
}

impl NativePlane {
    #[inline]
    pub fn texture_archive(&self) -> u16 {
        split_texture(self.texture).0
    }

    #[inline]
    pub fn texture_record(&self) -> u16 {
        split_texture(self.texture).1
    }
}

/// Planes sharing one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub texture_archive: u16,
    pub texture_record: u16,
    pub planes: Vec<NativePlane>,
}

/// A parsed mesh record.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeMesh {
    pub version: Version,
    pub radius: u32,
    pub point_count: usize,
    /// Submeshes in order of first texture appearance.
    pub submeshes: Vec<SubMesh>,
    /// Planes dropped at parse time for having fewer than three points.
    pub skipped_planes: Vec<usize>,
}

impl NativeMesh {
    /// Parse a mesh record.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: Arch3dHeader = reader.read_struct()?;
        let version = Version::try_from(header.version)?;

        let point_count = non_negative("point count", header.point_count)?;
        let plane_count = non_negative("plane count", header.plane_count)?;

        let points = read_vectors(
            data,
            "point list",
            non_negative("point list offset", header.point_list_offset)?,
            point_count,
            1.0,
        )?;
        let normals = read_vectors(
            data,
            "normal list",
            non_negative("normal list offset", header.normal_list_offset)?,
            plane_count,
            NORMAL_SCALE,
        )?;

        let mut reader = BinaryReader::new_at(
            data,
            non_negative("plane list offset", header.plane_list_offset)?,
        );

        let mut submeshes: Vec<SubMesh> = Vec::new();
        let mut by_texture: FxHashMap<u16, usize> = FxHashMap::default();
        let mut skipped_planes = Vec::new();

        for plane_index in 0..plane_count {
            let plane_header: PlaneHeader = reader.read_struct()?;
            let count = plane_header.point_count as usize;
            let normal = normals[plane_index];

            let mut plane_points = Vec::with_capacity(count);
            for _ in 0..count {
                let point: PlanePoint = reader.read_struct()?;
                let offset = point.offset;
                let index = offset / version.point_divisor();
                let position = usize::try_from(index)
                    .ok()
                    .and_then(|i| points.get(i))
                    .ok_or(Error::PointOutOfRange {
                        offset,
                        index: index.max(0) as usize,
                        count: points.len(),
                    })?;

                plane_points.push(NativePoint {
                    position: *position,
                    normal,
                    uv: [point.u, point.v],
                });
            }

            if count < 3 {
                tracing::warn!(
                    plane = plane_index,
                    points = count,
                    "skipping plane with fewer than 3 points"
                );
                skipped_planes.push(plane_index);
                continue;
            }

            let plane = NativePlane {
                index: plane_index,
                texture: plane_header.texture,
                points: plane_points,
            };

            let slot = *by_texture.entry(plane.texture).or_insert_with(|| {
                submeshes.push(SubMesh {
                    texture_archive: plane.texture_archive(),
                    texture_record: plane.texture_record(),
                    planes: Vec::new(),
                });
                submeshes.len() - 1
            });
            submeshes[slot].planes.push(plane);
        }

        Ok(Self {
            version,
            radius: header.radius,
            point_count,
            submeshes,
            skipped_planes,
        })
    }

    /// Number of planes across all submeshes.
    pub fn plane_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.planes.len()).sum()
    }

    /// Number of triangles the planes expand to.
    pub fn triangle_count(&self) -> usize {
        self.submeshes
            .iter()
            .flat_map(|s| &s.planes)
            .map(|p| p.points.len() - 2)
            .sum()
    }
}

const VECTOR_SIZE: usize = 12;

fn non_negative(field: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidHeaderField { field, value })
}

/// Read `count` fixed-point vectors of three i32 each.
fn read_vectors(
    data: &[u8],
    field: &'static str,
    offset: usize,
    count: usize,
    scale: f32,
) -> Result<Vec<[f32; 3]>> {
    let expected = count
        .checked_mul(VECTOR_SIZE)
        .and_then(|len| len.checked_add(offset))
        .unwrap_or(usize::MAX);
    if expected > data.len() {
        return Err(Error::TruncatedRecord {
            field,
            expected,
            actual: data.len(),
        });
    }

    let mut reader = BinaryReader::new_at(data, offset);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let x = reader.read_i32()? as f32 / scale;
        let y = reader.read_i32()? as f32 / scale;
        let z = reader.read_i32()? as f32 / scale;
        out.push([x, y, z]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MeshRecordWriter, TestPlane};

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<Arch3dHeader>(), Arch3dHeader::SIZE);
        assert_eq!(std::mem::size_of::<PlaneHeader>(), 8);
        assert_eq!(std::mem::size_of::<PlanePoint>(), 8);
    }

    #[test]
    fn test_split_texture() {
        assert_eq!(split_texture((112 << 7) | 3), (112, 3));
    }

    #[test]
    fn test_parse_groups_by_texture() {
        let mut writer = MeshRecordWriter::new(Version::V2_7);
        let a = writer.point([0, 0, 0]);
        let b = writer.point([256, 0, 0]);
        let c = writer.point([256, 0, 256]);
        let d = writer.point([0, 0, 256]);

        let abc = [(a, [0, 0]), (b, [64, 0]), (c, [0, 64])];
        let acd = [(a, [0, 0]), (c, [64, 0]), (d, [0, 64])];
        let abcd = [(a, [0, 0]), (b, [64, 0]), (c, [0, 64]), (d, [0, 0])];
        writer.plane(TestPlane::new(10, 1, [0, 256, 0]).with_points(&abc));
        writer.plane(TestPlane::new(11, 0, [0, 256, 0]).with_points(&acd));
        writer.plane(TestPlane::new(10, 1, [0, -256, 0]).with_points(&abcd));

        let mesh = NativeMesh::parse(&writer.build()).unwrap();

        assert_eq!(mesh.version, Version::V2_7);
        assert_eq!(mesh.point_count, 4);
        assert_eq!(mesh.submeshes.len(), 2);
        assert_eq!((mesh.submeshes[0].texture_archive, mesh.submeshes[0].texture_record), (10, 1));
        assert_eq!(mesh.submeshes[0].planes.len(), 2);
        assert_eq!(mesh.submeshes[0].planes[1].index, 2);
        assert_eq!(mesh.submeshes[0].planes[1].points[2].position, [256.0, 0.0, 256.0]);
        assert_eq!(mesh.submeshes[0].planes[1].points[0].normal, [0.0, -1.0, 0.0]);
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_old_versions_use_word_offsets() {
        let mut writer = MeshRecordWriter::new(Version::V2_5);
        let a = writer.point([0, 0, 0]);
        let b = writer.point([10, 0, 0]);
        let c = writer.point([0, 10, 0]);
        let points = [(a, [0, 0]), (b, [1, 0]), (c, [0, 1])];
        writer.plane(TestPlane::new(0, 0, [0, 0, 256]).with_points(&points));

        let mesh = NativeMesh::parse(&writer.build()).unwrap();
        let points = &mesh.submeshes[0].planes[0].points;
        assert_eq!(points[1].position, [10.0, 0.0, 0.0]);
        assert_eq!(points[2].position, [0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_short_planes_are_skipped() {
        let mut writer = MeshRecordWriter::new(Version::V2_7);
        let a = writer.point([0, 0, 0]);
        let b = writer.point([1, 0, 0]);
        writer.plane(TestPlane::new(0, 0, [0, 0, 0]).with_points(&[(a, [0, 0]), (b, [0, 0])]));

        let mesh = NativeMesh::parse(&writer.build()).unwrap();
        assert!(mesh.submeshes.is_empty());
        assert_eq!(mesh.skipped_planes, vec![0]);
    }

    #[test]
    fn test_point_out_of_range() {
        let mut writer = MeshRecordWriter::new(Version::V2_7);
        let a = writer.point([0, 0, 0]);
        let points = [(a, [0, 0]), (a + 1, [0, 0]), (a, [0, 0])];
        writer.plane(TestPlane::new(0, 0, [0, 0, 0]).with_points(&points));

        assert!(matches!(
            NativeMesh::parse(&writer.build()),
            Err(Error::PointOutOfRange { index: 1, count: 1, .. })
        ));
    }

    #[test]
    fn test_oversized_counts_are_truncation_errors() {
        let mut writer = MeshRecordWriter::new(Version::V2_7);
        let a = writer.point([0, 0, 0]);
        let b = writer.point([1, 0, 0]);
        let c = writer.point([0, 1, 0]);
        writer.plane(TestPlane::new(0, 0, [0, 0, 256]).with_points(&[
            (a, [0, 0]),
            (b, [1, 0]),
            (c, [0, 1]),
        ]));
        let bytes = writer.build();

        let mut points = bytes.clone();
        points[4..8].copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(
            NativeMesh::parse(&points),
            Err(Error::TruncatedRecord { field: "point list", .. })
        ));

        let mut planes = bytes;
        planes[8..12].copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(
            NativeMesh::parse(&planes),
            Err(Error::TruncatedRecord { field: "normal list", .. })
        ));
    }

    #[test]
    fn test_invalid_version() {
        let mut writer = MeshRecordWriter::new(Version::V2_7);
        writer.point([0, 0, 0]);
        let mut bytes = writer.build();
        bytes[0..4].copy_from_slice(b"v9.9");

        assert!(matches!(NativeMesh::parse(&bytes), Err(Error::InvalidVersion(_))));
    }
}
