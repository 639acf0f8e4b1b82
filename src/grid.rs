use ndarray::Array3;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::{MarchingCubesError, Result},
    tables::CORNER_OFFSETS,
    types::{Point, Value, Vector},
};

/// Axis-aligned cube of space to sample: `min` plus `size` along every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Minimum corner.
    pub min: Point,
    /// Edge length along X, Y and Z.
    pub size: Value,
}

impl Region {
    /// Returns [`MarchingCubesError::InvalidFieldSize`] unless `size` is positive and finite.
    pub fn new(min: Point, size: Value) -> Result<Self> {
        if size.is_finite() && size > 0.0 {
            Ok(Self { min, size })
        } else {
            Err(MarchingCubesError::InvalidFieldSize { size })
        }
    }

    /// The cube reaching `half_extent` from `centre` along each axis.
    pub fn centered(centre: Point, half_extent: Value) -> Result<Self> {
        Self::new(centre - Vector::repeat(half_extent), 2.0 * half_extent)
    }

    /// Edge length of one cell when the region is split into `resolution` cells per axis.
    pub fn cell_size(&self, resolution: usize) -> Value {
        self.size / resolution as Value
    }
}

/// One grid vertex: where it is and what the field returned there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    pub position: Point,
    pub value: Value,
}

/// A field sampled once at every vertex of a regular grid.
///
/// The grid has `resolution` cells and `resolution + 1` vertices per axis. Samples are
/// stored as `samples[[z, y, x]]` in standard layout, so the flat offset of vertex
/// `(x, y, z)` is `x + (y + z * (resolution + 1)) * (resolution + 1)`.
///
/// Samples are immutable once taken and shared by the (up to 8) cells touching each vertex.
#[derive(Debug, Clone)]
pub struct Grid {
    region: Region,
    resolution: usize,
    cell_size: Value,
    samples: Array3<GridSample>,
}

impl Grid {
    /// Evaluates `field` exactly once at each of the `(resolution + 1)³` grid vertices.
    ///
    /// When `parallel` is set the evaluations are spread over rayon's pool; each writes a
    /// distinct slot, so the samples are the same either way.
    ///
    /// Fails fast on a NaN/infinite field value, and on a resolution that is zero or whose
    /// vertex count does not fit in memory.
    pub fn sample<F>(region: Region, resolution: usize, field: &F, parallel: bool) -> Result<Self>
    where
        F: Fn(Point) -> Value + Sync,
    {
        if resolution == 0 {
            return Err(MarchingCubesError::InvalidResolution { resolution });
        }
        // Regions built as struct literals bypass `Region::new`.
        let region = Region::new(region.min, region.size)?;

        let cell_size = region.cell_size(resolution);
        // The whole vertex lattice has to fit in one allocation.
        let max_samples = isize::MAX as usize / std::mem::size_of::<GridSample>();
        let (dim, count) = resolution
            .checked_add(1)
            .and_then(|dim| Some((dim, dim.checked_mul(dim)?.checked_mul(dim)?)))
            .filter(|&(_, count)| count <= max_samples)
            .ok_or(MarchingCubesError::InvalidResolution { resolution })?;

        let sample_at = |index: usize| -> Result<GridSample> {
            let [x, y, z] = unflatten(index, dim);
            let position = Point::new(
                region.min.x + x as Value * cell_size,
                region.min.y + y as Value * cell_size,
                region.min.z + z as Value * cell_size,
            );
            let value = field(position);
            if !value.is_finite() {
                return Err(MarchingCubesError::NonFiniteSample { x, y, z, value });
            }
            Ok(GridSample { position, value })
        };

        let flat: Vec<GridSample> = if parallel {
            (0..count).into_par_iter().map(sample_at).collect::<Result<_>>()?
        } else {
            (0..count).map(sample_at).collect::<Result<_>>()?
        };

        tracing::trace!(resolution, samples = count, "sampled grid");

        let samples = Array3::from_shape_vec((dim, dim, dim), flat)
            .map_err(|_| MarchingCubesError::InvalidResolution { resolution })?;

        Ok(Self {
            region,
            resolution,
            cell_size,
            samples,
        })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Number of cells along each axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_size(&self) -> Value {
        self.cell_size
    }

    /// Number of vertices along each axis.
    pub fn vertex_dim(&self) -> usize {
        self.resolution + 1
    }

    /// Flat offset of vertex `(x, y, z)`.
    #[inline]
    pub fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        let dim = self.vertex_dim();
        x + (y + z * dim) * dim
    }

    /// Inverse of [`flat_index`](Grid::flat_index).
    #[inline]
    pub fn coord(&self, index: usize) -> [usize; 3] {
        unflatten(index, self.vertex_dim())
    }

    /// The sample at vertex `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> GridSample {
        self.samples[[z, y, x]]
    }

    /// All samples, `[z, y, x]`-indexed.
    pub fn samples(&self) -> &Array3<GridSample> {
        &self.samples
    }

    /// Positions and values of the 8 corners of cell `(x, y, z)`, in table corner order.
    #[inline]
    pub fn cell_corners(&self, x: usize, y: usize, z: usize) -> ([Point; 8], [Value; 8]) {
        let corners = CORNER_OFFSETS.map(|[dx, dy, dz]| self.get(x + dx, y + dy, z + dz));
        (corners.map(|s| s.position), corners.map(|s| s.value))
    }
}

#[inline]
fn unflatten(index: usize, dim: usize) -> [usize; 3] {
    [index % dim, (index / dim) % dim, index / (dim * dim)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_region() -> Region {
        Region::new(Point::new(-1.0, -1.0, -1.0), 2.0).unwrap()
    }

    #[test]
    fn region_rejects_degenerate_sizes() {
        assert_eq!(
            Region::new(Point::origin(), 0.0),
            Err(MarchingCubesError::InvalidFieldSize { size: 0.0 })
        );
        assert!(Region::new(Point::origin(), -1.0).is_err());
        assert!(Region::new(Point::origin(), Value::NAN).is_err());
        assert!(Region::centered(Point::origin(), 0.0).is_err());
    }

    #[test]
    fn centered_region_spans_both_sides() {
        let region = Region::centered(Point::new(1.0, 0.0, 0.0), 0.5).unwrap();
        assert_eq!(region.min, Point::new(0.5, -0.5, -0.5));
        assert_eq!(region.size, 1.0);
        assert_eq!(region.cell_size(4), 0.25);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let err = Grid::sample(unit_region(), 0, &|_: Point| 1.0, false).unwrap_err();
        assert_eq!(err, MarchingCubesError::InvalidResolution { resolution: 0 });
    }

    #[test]
    fn oversized_resolution_is_rejected() {
        let field = |_: Point| -> Value { panic!("field must not be sampled") };
        for resolution in [1 << 22, usize::MAX] {
            assert_eq!(
                Grid::sample(unit_region(), resolution, &field, false).unwrap_err(),
                MarchingCubesError::InvalidResolution { resolution }
            );
        }
    }

    #[test]
    fn struct_literal_regions_are_still_validated() {
        let region = Region {
            min: Point::origin(),
            size: -2.0,
        };
        let err = Grid::sample(region, 2, &|_: Point| 1.0, false).unwrap_err();
        assert_eq!(err, MarchingCubesError::InvalidFieldSize { size: -2.0 });
    }

    #[test]
    fn flat_index_is_a_bijection() {
        let grid = Grid::sample(unit_region(), 3, &|_: Point| 1.0, false).unwrap();
        let dim = grid.vertex_dim();
        let mut seen = vec![false; dim * dim * dim];
        for z in 0..dim {
            for y in 0..dim {
                for x in 0..dim {
                    let index = grid.flat_index(x, y, z);
                    assert_eq!(grid.coord(index), [x, y, z]);
                    assert!(!seen[index]);
                    seen[index] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn flat_index_matches_storage_layout() {
        let field = |p: Point| p.x + 10.0 * p.y + 100.0 * p.z;
        let grid = Grid::sample(unit_region(), 2, &field, false).unwrap();
        let flat = grid.samples().as_slice().unwrap();
        for (index, sample) in flat.iter().enumerate() {
            let [x, y, z] = grid.coord(index);
            assert_eq!(*sample, grid.get(x, y, z));
        }
    }

    #[test]
    fn each_vertex_is_evaluated_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let field = |p: Point| {
            calls.fetch_add(1, Ordering::Relaxed);
            p.coords.norm() - 0.5
        };
        Grid::sample(unit_region(), 4, &field, true).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 5 * 5 * 5);
    }

    #[test]
    fn positions_step_by_cell_size() {
        let grid = Grid::sample(unit_region(), 4, &|p: Point| p.x, false).unwrap();
        assert_eq!(grid.cell_size(), 0.5);
        assert_eq!(grid.get(0, 0, 0).position, Point::new(-1.0, -1.0, -1.0));
        assert_eq!(grid.get(4, 2, 1).position, Point::new(1.0, 0.0, -0.5));
        assert_eq!(grid.get(4, 2, 1).value, 1.0);
    }

    #[test]
    fn parallel_and_serial_sampling_agree() {
        let field = |p: Point| (p.x * 3.1).sin() + p.y * p.z;
        let serial = Grid::sample(unit_region(), 6, &field, false).unwrap();
        let parallel = Grid::sample(unit_region(), 6, &field, true).unwrap();
        assert_eq!(serial.samples(), parallel.samples());
    }

    #[test]
    fn non_finite_samples_fail_fast() {
        let field = |p: Point| if p.x > 0.9 { Value::NAN } else { 1.0 };
        let err = Grid::sample(unit_region(), 2, &field, false).unwrap_err();
        assert!(matches!(err, MarchingCubesError::NonFiniteSample { x: 2, .. }));
    }

    #[test]
    fn cell_corners_follow_table_order() {
        let grid = Grid::sample(unit_region(), 2, &|p: Point| p.x, false).unwrap();
        let (positions, values) = grid.cell_corners(1, 0, 1);
        for (i, [dx, dy, dz]) in CORNER_OFFSETS.iter().enumerate() {
            assert_eq!(positions[i], grid.get(1 + dx, *dy, 1 + dz).position);
            assert_eq!(values[i], positions[i].x);
        }
    }
}
