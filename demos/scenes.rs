//! Meshes every preset scene and prints what came out.
//!
//! ```text
//! cargo run --release --example scenes
//! ```

use std::time::Instant;

use sdf_marching_cubes::{
    MarchMesh, MarchingCubesConfig, MeshBuilder, Result,
    builder::{VertexSharing, Winding},
    scenes,
};

fn report(name: &str, mesh: &MarchMesh, started: Instant) {
    println!(
        "{name:<12} {:>7} triangles {:>7} vertices  {:>8.2?}",
        mesh.triangle_count(),
        mesh.vertices.len(),
        started.elapsed()
    );
}

fn main() -> Result<()> {
    // Counter-clockwise front faces with one vertex per grid edge, ready for a GPU buffer.
    let builder = MeshBuilder::new(MarchingCubesConfig {
        winding: Winding::Flipped,
        vertex_sharing: VertexSharing::SharedEdges,
        ..Default::default()
    });

    let started = Instant::now();
    let scene = scenes::sphere()?;
    report(scene.name, &scene.build(&builder)?, started);

    let started = Instant::now();
    let scene = scenes::sphere_pair()?;
    report(scene.name, &scene.build(&builder)?, started);

    let started = Instant::now();
    let scene = scenes::cuboid()?;
    report(scene.name, &scene.build(&builder)?, started);

    let started = Instant::now();
    let scene = scenes::dumbbell()?;
    report(scene.name, &scene.build(&builder)?, started);

    Ok(())
}
