use std::collections::HashMap;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::{MarchingCubesError, Result},
    grid::{Grid, Region},
    mesh::MarchMesh,
    normals::{NORMAL_EPSILON, estimate_normals},
    polygonise::{edge_endpoints, polygonise_edges},
    tables::CORNER_OFFSETS,
    types::{Point, Value},
};

/// Vertex order written to the index buffer for each triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    /// Triangle table order: `vidx, vidx + 1, vidx + 2`.
    ///
    /// For a field that is negative inside, the right-handed face normal of each triangle
    /// points into the surface.
    #[default]
    Table,
    /// Second and third vertex swapped: `vidx, vidx + 2, vidx + 1`.
    ///
    /// Right-handed face normals point out of the surface, as counter-clockwise front-face
    /// renderers expect.
    Flipped,
}

impl Winding {
    #[inline]
    fn order(self, [a, b, c]: [u32; 3]) -> [u32; 3] {
        match self {
            Winding::Table => [a, b, c],
            Winding::Flipped => [a, c, b],
        }
    }
}

/// How emitted triangle vertices map onto the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexSharing {
    /// Every triangle gets three fresh vertices; indices count up from zero.
    #[default]
    Soup,
    /// Triangles crossing the same grid edge reuse one vertex.
    ///
    /// Both cells sharing an edge compute the same crossing point, so this is an exact
    /// weld with no tolerance involved.
    SharedEdges,
}

/// Configuration for the marching cubes pipeline.
///
/// ```rust
/// use sdf_marching_cubes::builder::{MarchingCubesConfig, Winding};
///
/// let config = MarchingCubesConfig {
///     winding: Winding::Flipped,
///     ..Default::default()
/// };
/// assert_eq!(config.isolevel, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchingCubesConfig {
    /// Iso-surface threshold. Corners strictly below it are "inside". Default: `0.0`.
    pub isolevel: Value,
    /// Central-difference step for vertex normals. Default: [`NORMAL_EPSILON`].
    pub normal_epsilon: Value,
    /// Default: [`Winding::Table`].
    pub winding: Winding,
    /// Default: [`VertexSharing::Soup`].
    pub vertex_sharing: VertexSharing,
    /// Spread sampling, polygonising and normal estimation over rayon's pool.
    ///
    /// The output is identical either way. Default: `true`.
    pub parallel: bool,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        Self {
            isolevel: 0.0,
            normal_epsilon: NORMAL_EPSILON,
            winding: Winding::default(),
            vertex_sharing: VertexSharing::default(),
            parallel: true,
        }
    }
}

/// A triangle vertex together with the grid edge it was interpolated on.
#[derive(Debug, Clone, Copy)]
struct EdgeVertex {
    position: Point,
    /// `flat_index(lower corner) * 3 + axis`.
    edge_key: usize,
}

/// Turns a scalar field into a [`MarchMesh`].
///
/// ```text
/// Grid::sample              →  (N+1)³ field evaluations, shared by neighbouring cells
/// polygonise_edges per cell (Z slabs in parallel):
///   get_state               →  256-entry lookup key
///   EDGE_TABLE[state]       →  bitmask of crossed edges
///   get_edge_points         →  up to 12 interpolated points
///   triangle_edges          →  triangles from TRI_TABLE
/// assemble                  →  vertex + index buffers
/// estimate_normals          →  6 field evaluations per vertex
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBuilder {
    config: MarchingCubesConfig,
}

impl MeshBuilder {
    pub fn new(config: MarchingCubesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarchingCubesConfig {
        &self.config
    }

    /// Samples `field` over `region` split into `resolution` cells per axis and extracts the
    /// surface where it equals the configured iso-level.
    ///
    /// An empty mesh is a valid result: the field never crosses the iso-level in `region`.
    pub fn build<F>(&self, region: Region, resolution: usize, field: &F) -> Result<MarchMesh>
    where
        F: Fn(Point) -> Value + Sync,
    {
        let epsilon = self.config.normal_epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(MarchingCubesError::InvalidEpsilon { epsilon });
        }

        let _span = tracing::debug_span!("build_mesh", resolution).entered();

        let grid = Grid::sample(region, resolution, field, self.config.parallel)?;
        let triangles = self.march(&grid);
        let mut mesh = self.assemble(&triangles)?;
        mesh.normals = estimate_normals(field, &mesh.vertices, epsilon, self.config.parallel);

        tracing::debug!(
            triangles = mesh.triangle_count(),
            vertices = mesh.vertices.len(),
            "marching cubes finished"
        );

        Ok(mesh)
    }

    /// Polygonises every cell of `grid`, in Z-slab order.
    fn march(&self, grid: &Grid) -> Vec<[EdgeVertex; 3]> {
        let slabs = 0..grid.resolution();

        // Each slab fills its own buffer; concatenating them in slab order keeps the
        // output independent of scheduling.
        let per_z: Vec<Vec<[EdgeVertex; 3]>> = if self.config.parallel {
            slabs.into_par_iter().map(|z| self.march_slab(grid, z)).collect()
        } else {
            slabs.map(|z| self.march_slab(grid, z)).collect()
        };

        let total: usize = per_z.iter().map(Vec::len).sum();
        let mut triangles = Vec::with_capacity(total);
        for mut slab in per_z {
            triangles.append(&mut slab);
        }
        triangles
    }

    fn march_slab(&self, grid: &Grid, z: usize) -> Vec<[EdgeVertex; 3]> {
        let isolevel = self.config.isolevel;
        let mut local = Vec::new();

        for y in 0..grid.resolution() {
            for x in 0..grid.resolution() {
                let (corner_positions, corner_values) = grid.cell_corners(x, y, z);

                let triangles = polygonise_edges(&corner_positions, &corner_values, isolevel);
                local.extend(triangles.map(|tri| {
                    tri.map(|(edge, position)| EdgeVertex {
                        position,
                        edge_key: edge_key(grid, [x, y, z], edge),
                    })
                }));
            }
        }

        local
    }

    fn assemble(&self, triangles: &[[EdgeVertex; 3]]) -> Result<MarchMesh> {
        let max_vertices = triangles.len() * 3;
        if u32::try_from(max_vertices).is_err() {
            return Err(MarchingCubesError::MeshTooLarge {
                vertices: max_vertices,
            });
        }

        let mut mesh = MarchMesh::new_empty();
        mesh.indices.reserve(max_vertices);

        match self.config.vertex_sharing {
            VertexSharing::Soup => {
                mesh.vertices.reserve(max_vertices);
                for tri in triangles {
                    let vidx = mesh.vertices.len() as u32;
                    mesh.vertices.extend(tri.iter().map(|v| v.position));
                    mesh.indices
                        .extend(self.config.winding.order([vidx, vidx + 1, vidx + 2]));
                }
            }
            VertexSharing::SharedEdges => {
                let mut by_edge: HashMap<usize, u32> = HashMap::new();
                for tri in triangles {
                    let ids = tri.map(|v| {
                        *by_edge.entry(v.edge_key).or_insert_with(|| {
                            mesh.vertices.push(v.position);
                            (mesh.vertices.len() - 1) as u32
                        })
                    });
                    mesh.indices.extend(self.config.winding.order(ids));
                }
            }
        }

        Ok(mesh)
    }
}

/// Identifies a grid edge by its lower vertex and axis, independent of which cell saw it.
#[inline]
fn edge_key(grid: &Grid, [x, y, z]: [usize; 3], edge: usize) -> usize {
    let (lower, upper) = edge_endpoints(edge);
    let [lx, ly, lz] = CORNER_OFFSETS[lower];
    let axis = (0..3)
        .position(|i| CORNER_OFFSETS[lower][i] != CORNER_OFFSETS[upper][i])
        .unwrap_or(0);
    grid.flat_index(x + lx, y + ly, z + lz) * 3 + axis
}

/// Builds a mesh with the default [`MarchingCubesConfig`].
///
/// Samples the cube `field_min .. field_min + field_size` with `grid_dims` cells per axis
/// and extracts the zero iso-surface of `field`.
///
/// ```rust
/// use sdf_marching_cubes::{build_mesh, sdf, types::Point};
///
/// let mesh = build_mesh(Point::new(-1.0, -1.0, -1.0), 2.0, 16, |p| {
///     sdf::sphere(p, Point::origin(), 0.5)
/// })
/// .unwrap();
/// assert!(!mesh.is_empty());
/// assert_eq!(mesh.vertices.len(), mesh.normals.len());
/// ```
pub fn build_mesh<F>(
    field_min: Point,
    field_size: Value,
    grid_dims: usize,
    field: F,
) -> Result<MarchMesh>
where
    F: Fn(Point) -> Value + Sync,
{
    let region = Region::new(field_min, field_size)?;
    MeshBuilder::default().build(region, grid_dims, &field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf;

    const RADIUS: Value = 0.25;

    fn sphere_field(p: Point) -> Value {
        sdf::sphere(p, Point::origin(), RADIUS)
    }

    fn sphere_region() -> Region {
        Region::centered(Point::origin(), RADIUS * 1.25).unwrap()
    }

    fn build(config: MarchingCubesConfig, resolution: usize) -> MarchMesh {
        MeshBuilder::new(config)
            .build(sphere_region(), resolution, &sphere_field)
            .unwrap()
    }

    fn serial() -> MarchingCubesConfig {
        MarchingCubesConfig {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn field_that_never_crosses_gives_empty_mesh() {
        let mesh = MeshBuilder::default()
            .build(sphere_region(), 10, &|p: Point| {
                sdf::sphere(p, Point::origin(), 0.0) + 1.0
            })
            .unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
        assert!(mesh.normals.is_empty());

        let inside = MeshBuilder::default()
            .build(sphere_region(), 10, &|_: Point| -1.0)
            .unwrap();
        assert!(inside.is_empty());
    }

    #[test]
    fn soup_indices_count_up() {
        let mesh = build(MarchingCubesConfig::default(), 12);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertices.len(), mesh.indices.len());
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        for (i, &index) in mesh.indices.iter().enumerate() {
            assert_eq!(index as usize, i);
        }
    }

    #[test]
    fn flipped_winding_swaps_last_two_indices() {
        let table = build(MarchingCubesConfig::default(), 8);
        let flipped = build(
            MarchingCubesConfig {
                winding: Winding::Flipped,
                ..Default::default()
            },
            8,
        );
        assert_eq!(table.vertices, flipped.vertices);
        for tri in 0..table.triangle_count() {
            let [a, b, c] = table.tri_indices(tri);
            assert_eq!(flipped.tri_indices(tri), [a, c, b]);
        }
    }

    #[test]
    fn parallel_and_serial_builds_are_identical() {
        assert_eq!(build(MarchingCubesConfig::default(), 20), build(serial(), 20));
    }

    #[test]
    fn repeated_builds_are_identical() {
        let a = build(MarchingCubesConfig::default(), 16);
        let b = build(MarchingCubesConfig::default(), 16);
        let bits = |mesh: &MarchMesh| -> Vec<u32> {
            mesh.vertices
                .iter()
                .map(|p| p.coords)
                .chain(mesh.normals.iter().copied())
                .flat_map(|v| [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()])
                .collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn shared_edges_describe_the_same_triangles() {
        let soup = build(MarchingCubesConfig::default(), 14);
        let shared = build(
            MarchingCubesConfig {
                vertex_sharing: VertexSharing::SharedEdges,
                ..Default::default()
            },
            14,
        );
        assert_eq!(soup.triangle_count(), shared.triangle_count());
        assert!(shared.vertices.len() < soup.vertices.len());
        assert!(soup.triangles().eq(shared.triangles()));
        assert_eq!(shared.normals.len(), shared.vertices.len());
    }

    #[test]
    fn isolevel_offsets_the_surface() {
        let mesh = build(
            MarchingCubesConfig {
                isolevel: 0.05,
                ..Default::default()
            },
            30,
        );
        let cell = sphere_region().cell_size(30);
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v.coords.norm() - (RADIUS + 0.05)).abs() < cell);
        }
    }

    #[test]
    fn single_cell_grid_cuts_one_corner() {
        let region = Region::new(Point::origin(), 1.0).unwrap();
        // Only the origin corner lies inside.
        let field = |p: Point| p.x + p.y + p.z - 0.5;
        let mesh = MeshBuilder::default().build(region, 1, &field).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        for v in &mesh.vertices {
            assert!((field(*v)).abs() < 1e-6);
        }
    }

    #[test]
    fn build_matches_per_cell_polygonise() {
        let resolution = 6;
        let mesh = build(serial(), resolution);
        let grid = Grid::sample(sphere_region(), resolution, &sphere_field, false).unwrap();

        let mut expected = Vec::new();
        for z in 0..resolution {
            for y in 0..resolution {
                for x in 0..resolution {
                    let (positions, values) = grid.cell_corners(x, y, z);
                    expected.extend(crate::polygonise::polygonise(&positions, &values, 0.0));
                }
            }
        }
        assert!(!expected.is_empty());
        assert!(mesh.triangles().eq(expected));
    }

    #[test]
    #[should_panic(expected = "field gave up")]
    fn field_panics_propagate_out_of_parallel_builds() {
        assert!(MarchingCubesConfig::default().parallel);
        let region = Region::new(Point::origin(), 1.0).unwrap();
        let field = |p: Point| {
            if p.x > 0.9 {
                panic!("field gave up");
            }
            p.x - 0.5
        };
        let _ = MeshBuilder::default().build(region, 8, &field);
    }

    #[test]
    fn oversized_resolution_is_an_error() {
        assert_eq!(
            MeshBuilder::default().build(sphere_region(), 1 << 22, &sphere_field),
            Err(MarchingCubesError::InvalidResolution { resolution: 1 << 22 })
        );
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let builder = MeshBuilder::default();
        assert_eq!(
            builder.build(sphere_region(), 0, &sphere_field),
            Err(MarchingCubesError::InvalidResolution { resolution: 0 })
        );
        assert_eq!(
            build_mesh(Point::origin(), 0.0, 10, sphere_field),
            Err(MarchingCubesError::InvalidFieldSize { size: 0.0 })
        );
        assert!(build_mesh(Point::origin(), -1.0, 10, sphere_field).is_err());

        let bad_epsilon = MeshBuilder::new(MarchingCubesConfig {
            normal_epsilon: 0.0,
            ..Default::default()
        });
        assert_eq!(
            bad_epsilon.build(sphere_region(), 4, &sphere_field),
            Err(MarchingCubesError::InvalidEpsilon { epsilon: 0.0 })
        );
    }

    #[test]
    fn edge_keys_agree_across_neighbouring_cells() {
        let grid = Grid::sample(sphere_region(), 4, &sphere_field, false).unwrap();
        // Edge 0 of cell (1, 1, 1) is edge 2 of the cell below it in Y.
        assert_eq!(edge_key(&grid, [1, 1, 1], 0), edge_key(&grid, [1, 0, 1], 2));
        // Edge 8 of cell (1, 1, 1) is edge 9 of the cell before it in X.
        assert_eq!(edge_key(&grid, [1, 1, 1], 8), edge_key(&grid, [0, 1, 1], 9));
        // Edge 3 of cell (1, 1, 1) is edge 7 of the cell before it in Z.
        assert_eq!(edge_key(&grid, [1, 1, 1], 3), edge_key(&grid, [1, 1, 0], 7));
        assert_ne!(edge_key(&grid, [1, 1, 1], 0), edge_key(&grid, [1, 1, 1], 3));
    }
}
