//! Ready-made fields for trying the mesher out.
//!
//! Each scene pairs a field with a region that encloses it and a resolution to sample at.

use crate::{
    builder::MeshBuilder,
    error::Result,
    grid::Region,
    mesh::MarchMesh,
    sdf::{self, BlendRadius},
    types::{Point, Value, Vector},
};

/// Cells per axis used by every preset.
pub const SCENE_RESOLUTION: usize = 50;

/// A field plus the cube of space it should be meshed in.
pub struct Scene<F> {
    pub name: &'static str,
    pub region: Region,
    pub resolution: usize,
    pub field: F,
}

impl<F> Scene<F>
where
    F: Fn(Point) -> Value + Sync,
{
    /// Meshes the scene with `builder`'s configuration.
    pub fn build(&self, builder: &MeshBuilder) -> Result<MarchMesh> {
        tracing::debug!(scene = self.name, "building scene");
        builder.build(self.region, self.resolution, &self.field)
    }
}

/// A sphere of radius 0.25 at the origin.
pub fn sphere() -> Result<Scene<impl Fn(Point) -> Value + Sync>> {
    let radius = 0.25;
    Ok(Scene {
        name: "sphere",
        region: Region::centered(Point::origin(), radius * 1.25)?,
        resolution: SCENE_RESOLUTION,
        field: move |p: Point| sdf::sphere(p, Point::origin(), radius),
    })
}

/// Two overlapping spheres along Z, joined by a hard union.
pub fn sphere_pair() -> Result<Scene<impl Fn(Point) -> Value + Sync>> {
    let radius = 0.25;
    let front = Point::new(0.0, 0.0, -radius * 0.5);
    let back = Point::new(0.0, 0.0, radius * 0.5);
    Ok(Scene {
        name: "sphere_pair",
        region: Region::centered(Point::origin(), radius * 1.25)?,
        resolution: SCENE_RESOLUTION,
        field: move |p: Point| {
            sdf::union(
                sdf::sphere(p, front, radius * 0.65),
                sdf::sphere(p, back, radius * 0.65),
            )
        },
    })
}

/// An axis-aligned box with half extents `(0.5, 0.4, 0.25)`.
pub fn cuboid() -> Result<Scene<impl Fn(Point) -> Value + Sync>> {
    let half_extent = Vector::new(0.5, 0.4, 0.25);
    Ok(Scene {
        name: "cuboid",
        region: Region::centered(Point::origin(), half_extent.max() * 1.25)?,
        resolution: SCENE_RESOLUTION,
        field: move |p: Point| sdf::cuboid(p, Point::origin(), half_extent),
    })
}

/// A thin bar along X with a sphere smoothly blended onto each end.
pub fn dumbbell() -> Result<Scene<impl Fn(Point) -> Value + Sync>> {
    let k = BlendRadius::new(0.2)?;
    let left = Point::new(-0.5, 0.0, 0.0);
    let right = Point::new(0.5, 0.0, 0.0);
    Ok(Scene {
        name: "dumbbell",
        region: Region::centered(Point::origin(), 1.0)?,
        resolution: SCENE_RESOLUTION,
        field: move |p: Point| {
            let bar = sdf::cuboid(p, Point::origin(), Vector::new(0.5, 0.05, 0.05));
            let d = sdf::blend(bar, sdf::sphere(p, left, 0.25), k);
            sdf::blend(d, sdf::sphere(p, right, 0.25), k)
        },
    })
}
