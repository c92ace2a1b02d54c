//! Wavefront OBJ export.

use std::io::{self, Write};

use crate::output::OutputMesh;

/// Material name used for a texture.
pub fn material_name(texture_archive: u16, texture_record: u16) -> String {
    format!("TEXTURE_{texture_archive:03}_{texture_record}")
}

/// Write a mesh as OBJ text, one `usemtl` group per submesh.
///
/// V is flipped since OBJ puts the texture origin at the bottom left.
pub fn write_obj<W: Write>(mesh: &OutputMesh, name: &str, mut out: W) -> io::Result<()> {
    writeln!(out, "o {name}")?;
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {}", v.position[0], v.position[1], v.position[2])?;
    }
    for v in &mesh.vertices {
        writeln!(out, "vt {} {}", v.uv[0], -v.uv[1])?;
    }
    for v in &mesh.vertices {
        writeln!(out, "vn {} {} {}", v.normal[0], v.normal[1], v.normal[2])?;
    }

    for range in &mesh.submeshes {
        writeln!(out, "usemtl {}", material_name(range.texture_archive, range.texture_record))?;
        for triangle in mesh.indices[range.index_range()].chunks_exact(3) {
            let [a, b, c] = [triangle[0] + 1, triangle[1] + 1, triangle[2] + 1];
            writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        }
    }
    out.flush()
}
