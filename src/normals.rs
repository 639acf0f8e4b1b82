use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::types::{Point, Value, Vector};

/// Default central-difference step.
pub const NORMAL_EPSILON: Value = 1e-4;

/// Estimates the outward surface normal at `p` from the field gradient.
///
/// Uses central differences with step `epsilon` along each axis. Assumes the field grows
/// away from the surface, as a signed distance does. A flat gradient (or one that cancels
/// out within `epsilon`) yields the zero vector rather than NaN.
#[inline]
pub fn estimate_normal<F>(field: &F, p: Point, epsilon: Value) -> Vector
where
    F: Fn(Point) -> Value + ?Sized,
{
    let dx = Vector::x() * epsilon;
    let dy = Vector::y() * epsilon;
    let dz = Vector::z() * epsilon;

    let gradient = Vector::new(
        field(p + dx) - field(p - dx),
        field(p + dy) - field(p - dy),
        field(p + dz) - field(p - dz),
    );

    gradient.try_normalize(0.0).unwrap_or_else(Vector::zeros)
}

/// Estimates one normal per vertex, index-aligned with `vertices`.
pub fn estimate_normals<F>(
    field: &F,
    vertices: &[Point],
    epsilon: Value,
    parallel: bool,
) -> Vec<Vector>
where
    F: Fn(Point) -> Value + Sync + ?Sized,
{
    if parallel {
        vertices
            .par_iter()
            .map(|&v| estimate_normal(field, v, epsilon))
            .collect()
    } else {
        vertices
            .iter()
            .map(|&v| estimate_normal(field, v, epsilon))
            .collect()
    }
}
