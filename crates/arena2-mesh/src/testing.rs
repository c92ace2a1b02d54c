//! Builders for synthetic mesh records used by tests.

use zerocopy::IntoBytes;

use crate::native::{Arch3dHeader, PlaneHeader, PlanePoint, Version};

pub(crate) struct TestPlane {
    texture: u16,
    normal: [i32; 3],
    points: Vec<(usize, [i16; 2])>,
}

impl TestPlane {
    pub(crate) fn new(archive: u16, record: u16, normal: [i32; 3]) -> Self {
        Self {
            texture: (archive << 7) | (record & 0x7F),
            normal,
            points: Vec::new(),
        }
    }

    pub(crate) fn with_points(mut self, points: &[(usize, [i16; 2])]) -> Self {
        self.points.extend_from_slice(points);
        self
    }
}

pub(crate) struct MeshRecordWriter {
    version: Version,
    points: Vec<[i32; 3]>,
    planes: Vec<TestPlane>,
}

impl MeshRecordWriter {
    pub(crate) fn new(version: Version) -> Self {
        Self {
            version,
            points: Vec::new(),
            planes: Vec::new(),
        }
    }

    pub(crate) fn point(&mut self, position: [i32; 3]) -> usize {
        self.points.push(position);
        self.points.len() - 1
    }

    pub(crate) fn plane(&mut self, plane: TestPlane) {
        self.planes.push(plane);
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let point_list_offset = Arch3dHeader::SIZE;
        let normal_list_offset = point_list_offset + self.points.len() * 12;
        let plane_list_offset = normal_list_offset + self.planes.len() * 12;

        let header = Arch3dHeader {
            version: self.version.magic(),
            point_count: self.points.len() as i32,
            plane_count: self.planes.len() as i32,
            radius: 512,
            null1: 0,
            plane_data_offset: 0,
            object_data_offset: 0,
            object_data_count: 0,
            unknown1: 0,
            null2: 0,
            point_list_offset: point_list_offset as i32,
            normal_list_offset: normal_list_offset as i32,
            unknown2: 0,
            plane_list_offset: plane_list_offset as i32,
        };

        let mut out = header.as_bytes().to_vec();
        for point in &self.points {
            out.extend_from_slice(point.as_bytes());
        }
        for plane in &self.planes {
            out.extend_from_slice(plane.normal.as_bytes());
        }
        for plane in &self.planes {
            let plane_header = PlaneHeader {
                point_count: plane.points.len() as u8,
                unknown1: 0,
                texture: plane.texture,
                unknown2: 0,
            };
            out.extend_from_slice(plane_header.as_bytes());
            for &(index, [u, v]) in &plane.points {
                let point = PlanePoint {
                    offset: index as i32 * self.version.point_divisor(),
                    u,
                    v,
                };
                out.extend_from_slice(point.as_bytes());
            }
        }
        out
    }
}
