//! End-to-end checks on the classic test case: a sphere of radius r meshed inside a cube
//! reaching 1.25 r from its centre, 50 cells per axis.

use std::collections::HashMap;

use sdf_marching_cubes::{
    MarchMesh, MarchingCubesConfig, MeshBuilder, build_mesh,
    builder::{VertexSharing, Winding},
    grid::Region,
    sdf,
    types::{Point, Value},
};

const RADIUS: Value = 0.25;
const CELLS: usize = 50;

fn field(p: Point) -> Value {
    sdf::sphere(p, Point::origin(), RADIUS)
}

fn region() -> Region {
    Region::centered(Point::origin(), RADIUS * 1.25).unwrap()
}

fn cell_size() -> Value {
    region().cell_size(CELLS)
}

fn sphere_mesh(config: MarchingCubesConfig) -> MarchMesh {
    MeshBuilder::new(config).build(region(), CELLS, &field).unwrap()
}

/// Counts how many triangles use each undirected edge.
fn edge_uses(triangles: impl Iterator<Item = [usize; 3]>) -> HashMap<(usize, usize), usize> {
    let mut uses = HashMap::new();
    for [a, b, c] in triangles {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *uses.entry((u.min(v), u.max(v))).or_insert(0) += 1;
        }
    }
    uses
}

#[test]
fn sphere_mesh_is_non_empty_and_on_the_surface() {
    let region = region();
    let mesh = build_mesh(region.min, region.size, CELLS, field).unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(mesh.indices.len() % 3, 0);
    assert_eq!(mesh.vertices.len(), mesh.normals.len());

    for v in &mesh.vertices {
        let r = v.coords.norm();
        assert!((r - RADIUS).abs() < cell_size(), "vertex {v:?} at radius {r}");
    }
}

#[test]
fn sphere_normals_point_outwards() {
    let mesh = sphere_mesh(MarchingCubesConfig::default());
    for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
        assert!((n.norm() - 1.0).abs() < 1e-3);
        assert!(n.dot(&v.coords.normalize()) > 0.99, "normal {n:?} at {v:?}");
    }
}

#[test]
fn shared_edge_sphere_is_closed() {
    let mesh = sphere_mesh(MarchingCubesConfig {
        vertex_sharing: VertexSharing::SharedEdges,
        ..Default::default()
    });

    let uses = edge_uses((0..mesh.triangle_count()).map(|t| mesh.tri_indices(t)));
    assert!(!uses.is_empty());
    for (edge, count) in uses {
        assert_eq!(count, 2, "edge {edge:?} is used by {count} triangles");
    }
}

#[test]
fn soup_sphere_is_closed_once_welded_by_position() {
    let mesh = sphere_mesh(MarchingCubesConfig::default());

    // Neighbouring cells compute bit-identical crossing points, so exact keys suffice.
    let mut ids: HashMap<[u32; 3], usize> = HashMap::new();
    let mut welded = |p: &Point| {
        let key = [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits());
        let next = ids.len();
        *ids.entry(key).or_insert(next)
    };
    let triangles: Vec<[usize; 3]> = mesh
        .triangles()
        .map(|tri| [welded(&tri[0]), welded(&tri[1]), welded(&tri[2])])
        // Corners sitting exactly on the surface collapse some triangles.
        .filter(|[a, b, c]| a != b && b != c && c != a)
        .collect();

    assert!(triangles.len() * 2 > mesh.triangle_count());
    // Collapsing vertices can only merge pairs of uses; an odd count would be a hole.
    for (edge, count) in edge_uses(triangles.into_iter()) {
        assert_eq!(count % 2, 0, "edge {edge:?} is used by {count} triangles");
    }
}

#[test]
fn winding_controls_face_orientation() {
    let min_area = cell_size() * cell_size() * 1e-2;

    let facing_out = |mesh: &MarchMesh| {
        let mut outward = 0;
        let mut counted = 0;
        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.tri_coords(t);
            if (b - a).cross(&(c - a)).norm() * 0.5 < min_area {
                continue;
            }
            counted += 1;
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            if mesh.tri_normal(t).dot(&centroid) > 0.0 {
                outward += 1;
            }
        }
        (outward, counted)
    };

    let (outward, counted) = facing_out(&sphere_mesh(MarchingCubesConfig::default()));
    assert!(counted > 1000);
    assert!(outward * 100 < counted, "table winding faces into the field: {outward}/{counted}");

    let (outward, counted) = facing_out(&sphere_mesh(MarchingCubesConfig {
        winding: Winding::Flipped,
        ..Default::default()
    }));
    assert!(outward * 100 > counted * 99, "flipped winding faces out: {outward}/{counted}");
}

#[test]
fn builds_are_deterministic() {
    let a = sphere_mesh(MarchingCubesConfig::default());
    let b = sphere_mesh(MarchingCubesConfig {
        parallel: false,
        ..Default::default()
    });
    assert_eq!(a, b);
}

#[test]
fn uniformly_positive_field_gives_empty_buffers() {
    let region = region();
    let mesh = build_mesh(region.min, region.size, CELLS, |p| {
        sdf::sphere(p, Point::origin(), -0.1)
    })
    .unwrap();
    assert!(mesh.vertices.is_empty());
    assert!(mesh.indices.is_empty());
    assert!(mesh.normals.is_empty());
}
