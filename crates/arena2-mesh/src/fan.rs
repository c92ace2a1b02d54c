//! Fan triangulation and axis conversion.

/// Axis convention applied when converting native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisConvention {
    /// Negate Y and Z.
    #[default]
    NegateYZ,
}

impl AxisConvention {
    /// Convert a native position or normal.
    #[inline]
    pub fn convert(self, v: [f32; 3]) -> [f32; 3] {
        match self {
            AxisConvention::NegateYZ => [v[0], -v[1], -v[2]],
        }
    }
}

/// Local fan indices for a polygon of `n` points.
///
/// Triangle `k` is `[0, k + 2, k + 1]`; the winding flip matches the
/// Y/Z negation of [`AxisConvention::NegateYZ`].
pub fn fan_indices(n: usize) -> Vec<u32> {
    if n < 3 {
        return Vec::new();
    }
    (0..n as u32 - 2).flat_map(|k| [0, k + 2, k + 1]).collect()
}
