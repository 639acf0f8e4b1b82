use crate::types::{Point, Value};

/// Below this distance a corner value counts as lying on the iso-level.
pub const INTERP_EPSILON: Value = 1e-5;

// Return the interpolation factor t corresponding to iso_val
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

/// Finds where the iso-surface crosses the edge `p1 → p2`.
///
/// Snaps to an endpoint whose value is within [`INTERP_EPSILON`] of `isolevel`, and returns
/// `p1` when the two values are too close to divide by. Otherwise interpolates linearly.
///
/// `p1` wins when both ends are within range, so the argument order decides which endpoint
/// a near-degenerate edge snaps to. The mesher always passes the lower grid corner first.
#[inline]
pub fn vertex_interp(isolevel: Value, p1: Point, p2: Point, v1: Value, v2: Value) -> Point {
    if (isolevel - v1).abs() < INTERP_EPSILON {
        return p1;
    }
    if (isolevel - v2).abs() < INTERP_EPSILON {
        return p2;
    }
    if (v1 - v2).abs() < INTERP_EPSILON {
        return p1;
    }

    p1 + (p2 - p1) * find_t(v1, v2, isolevel)
}
