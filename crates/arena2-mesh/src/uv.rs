//! Texture coordinate reconstruction.
//!
//! Only the first point of a plane stores an absolute UV. Points 1 and 2 store
//! deltas, accumulated in order. Points beyond index 2 carry no usable UV at
//! all; their coordinates come from the affine map fixed by the first three
//! points:
//!
//! 1. Build an orthonormal basis of the plane from `P1 - P0` and `P2 - P0`
//!    (Gram-Schmidt).
//! 2. Project the three points into that basis.
//! 3. Solve `U = A·x + B·y + D` (and likewise for V) with the 3×3 determinant
//!    and its cofactors.
//!
//! A zero determinant means the first three points are collinear or
//! coincident; that face has no texture mapping and is reported as
//! [`Error::DegenerateFace`].

use glam::{DVec2, DVec3};

use crate::{Error, Result};

/// Relative tolerance below which the basis or determinant is degenerate.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Affine map from a plane's 3D points to texture space.
#[derive(Debug, Clone, Copy)]
pub struct UvSolver {
    origin: DVec3,
    axis_x: DVec3,
    axis_y: DVec3,
    /// (A, B, D) for U.
    u: DVec3,
    /// (A, B, D) for V.
    v: DVec3,
}

impl UvSolver {
    /// Solve the map from three points and their absolute UVs.
    pub fn new(points: [[f32; 3]; 3], uvs: [[f32; 2]; 3]) -> Result<Self> {
        let p = points.map(|p| DVec3::from(p.map(f64::from)));
        let origin = p[0];

        let edge1 = p[1] - origin;
        let edge2 = p[2] - origin;
        let scale = edge1.length().max(edge2.length());
        if scale <= DEGENERATE_EPSILON {
            return Err(Error::DegenerateFace);
        }

        let axis_x = edge1.try_normalize().ok_or(Error::DegenerateFace)?;
        let perpendicular = edge2 - axis_x * edge2.dot(axis_x);
        if perpendicular.length() <= DEGENERATE_EPSILON * scale {
            return Err(Error::DegenerateFace);
        }
        let axis_y = perpendicular.normalize();

        let project = |point: DVec3| {
            let d = point - origin;
            DVec2::new(d.dot(axis_x), d.dot(axis_y))
        };
        let [q0, q1, q2] = p.map(project);

        let det = q0.x * (q1.y - q2.y) - q0.y * (q1.x - q2.x) + (q1.x * q2.y - q2.x * q1.y);
        if det.abs() <= DEGENERATE_EPSILON * scale * scale {
            return Err(Error::DegenerateFace);
        }

        // Cofactors of [[x0 y0 1] [x1 y1 1] [x2 y2 1]], one column per unknown.
        let cof_a = DVec3::new(q1.y - q2.y, q2.y - q0.y, q0.y - q1.y);
        let cof_b = DVec3::new(q2.x - q1.x, q0.x - q2.x, q1.x - q0.x);
        let cof_d = DVec3::new(
            q1.x * q2.y - q2.x * q1.y,
            q2.x * q0.y - q0.x * q2.y,
            q0.x * q1.y - q1.x * q0.y,
        );

        let solve = |values: DVec3| {
            DVec3::new(
                cof_a.dot(values) / det,
                cof_b.dot(values) / det,
                cof_d.dot(values) / det,
            )
        };

        let us = DVec3::new(uvs[0][0].into(), uvs[1][0].into(), uvs[2][0].into());
        let vs = DVec3::new(uvs[0][1].into(), uvs[1][1].into(), uvs[2][1].into());

        Ok(Self {
            origin,
            axis_x,
            axis_y,
            u: solve(us),
            v: solve(vs),
        })
    }

    /// Coordinates of a point in the plane basis.
    pub fn project(&self, point: [f32; 3]) -> DVec2 {
        let d = DVec3::from(point.map(f64::from)) - self.origin;
        DVec2::new(d.dot(self.axis_x), d.dot(self.axis_y))
    }

    /// Texture coordinate of a point.
    pub fn uv_at(&self, point: [f32; 3]) -> [f32; 2] {
        let q = self.project(point).extend(1.0);
        [self.u.dot(q) as f32, self.v.dot(q) as f32]
    }
}

/// Absolute UVs of the first three points from the stored values.
pub fn accumulate_deltas(stored: [[i16; 2]; 3]) -> [[f32; 2]; 3] {
    let mut out = [[0.0f32; 2]; 3];
    let mut running = [0i32; 2];
    for (slot, value) in out.iter_mut().zip(stored) {
        running[0] += value[0] as i32;
        running[1] += value[1] as i32;
        *slot = [running[0] as f32, running[1] as f32];
    }
    out
}

/// Absolute UVs for every point of a plane.
///
/// `positions` and `stored` are parallel arrays. Every plane is checked for
/// a solvable mapping, including triangles whose UVs are all stored.
pub fn reconstruct_uvs(positions: &[[f32; 3]], stored: &[[i16; 2]]) -> Result<Vec<[f32; 2]>> {
    let n = positions.len();
    if n < 3 || stored.len() != n {
        return Err(Error::TooFewPoints(n.min(stored.len())));
    }

    let first = accumulate_deltas([stored[0], stored[1], stored[2]]);
    let solver = UvSolver::new([positions[0], positions[1], positions[2]], first)?;

    let mut uvs = first.to_vec();
    uvs.extend(positions[3..].iter().map(|&p| solver.uv_at(p)));
    Ok(uvs)
}
