use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Three vertex positions, in emission (winding) order.
pub type Triangle = [Point; 3];

/// A scalar field function: maps a [`Point`] to a [`Value`].
///
/// Values **strictly below** the iso-level are considered "inside" the surface. Every entry
/// point is generic over `Fn(Point) -> Value + Sync`; this alias is for callers that want to
/// store a field behind a pointer.
pub type ScalarField = dyn Fn(Point) -> Value + Sync;
