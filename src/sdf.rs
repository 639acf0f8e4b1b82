//! Signed distance primitives and the operators used to combine them.
//!
//! Distances are negative inside a shape and positive outside. Composite fields are plain
//! closures nesting these calls:
//!
//! ```
//! use sdf_marching_cubes::sdf::{self, BlendRadius};
//! use sdf_marching_cubes::types::{Point, Vector};
//!
//! let k = BlendRadius::new(0.2).unwrap();
//! let field = move |p: Point| {
//!     let bar = sdf::cuboid(p, Point::origin(), Vector::new(0.5, 0.05, 0.05));
//!     sdf::blend(bar, sdf::sphere(p, Point::new(0.5, 0.0, 0.0), 0.25), k)
//! };
//! assert!(field(Point::origin()) < 0.0);
//! ```

use crate::{
    error::{MarchingCubesError, Result},
    types::{Point, Value, Vector},
};

/// Distance from `p` to a sphere of `radius` around `centre`.
#[inline]
pub fn sphere(p: Point, centre: Point, radius: Value) -> Value {
    (p - centre).norm() - radius
}

/// Distance from `p` to an axis-aligned box around `centre`.
///
/// Exact outside the box, and the distance to the nearest face inside it.
#[inline]
pub fn cuboid(p: Point, centre: Point, half_extent: Vector) -> Value {
    let d = (p - centre).abs() - half_extent;
    let inside = d.max().min(0.0);
    let outside = d.sup(&Vector::zeros()).norm();
    inside + outside
}

/// Hard union of two fields.
#[inline]
pub fn union(a: Value, b: Value) -> Value {
    a.min(b)
}

/// Falloff distance of a [`smooth_min`] blend.
///
/// Only positive, finite radii can be constructed, so a blend can never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BlendRadius(Value);

impl BlendRadius {
    /// Returns [`MarchingCubesError::InvalidBlendRadius`] unless `k > 0` and finite.
    pub fn new(k: Value) -> Result<Self> {
        if k.is_finite() && k > 0.0 {
            Ok(Self(k))
        } else {
            Err(MarchingCubesError::InvalidBlendRadius { k })
        }
    }

    pub fn get(self) -> Value {
        self.0
    }
}

impl TryFrom<Value> for BlendRadius {
    type Error = MarchingCubesError;

    fn try_from(k: Value) -> Result<Self> {
        Self::new(k)
    }
}

/// Quadratic smooth minimum.
///
/// Matches [`union`] wherever `a` and `b` differ by more than `k`, and rounds the crease
/// between them otherwise. The result never exceeds `min(a, b)`.
#[inline]
pub fn smooth_min(a: Value, b: Value, k: BlendRadius) -> Value {
    let k = k.get();
    let h = (k - (a - b).abs()).max(0.0);
    a.min(b) - h * h * 0.25 / k
}

/// Alias for [`smooth_min`].
#[inline]
pub fn blend(a: Value, b: Value, k: BlendRadius) -> Value {
    smooth_min(a, b, k)
}
