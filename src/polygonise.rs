use crate::{
    interp::vertex_interp,
    tables::{CORNER_OFFSETS, CORNER_POINT_INDICES, EDGE_TABLE, TRI_END, TRI_TABLE},
    types::{Point, Triangle, Value},
};

/// Computes the marching cubes state bitmask for a cell.
///
/// Each of the 8 corners maps to one bit. A bit is set when the corner's value
/// is **strictly below** the iso-level; a value equal to it counts as outside:
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// state bits:   [_][_][_][_][_][_][_][_]
///                                      ^-- corner 0 inside?
/// ```
#[inline]
pub fn get_state(corner_values: &[Value; 8], isolevel: Value) -> usize {
    corner_values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < isolevel)
        .fold(0, |state, (i, _)| state | (1 << i))
}

/// Returns the corners joined by `edge`, lower grid corner first.
#[inline]
pub(crate) fn edge_endpoints(edge: usize) -> (usize, usize) {
    let [a, b] = CORNER_POINT_INDICES[edge];
    let (a, b) = (a as usize, b as usize);
    let rank = |c: usize| CORNER_OFFSETS[c].iter().sum::<usize>();
    if rank(a) <= rank(b) { (a, b) } else { (b, a) }
}

/// Interpolates the crossing point on each edge of the cell set in `edges_mask`.
///
/// `edges_mask` is a 12-bit field from `EDGE_TABLE`; edges whose bit is clear stay `None`.
/// Every edge is interpolated from its lower grid corner, so neighbouring cells compute
/// bit-identical points for the edges they share.
///
/// This is not always the order `CORNER_POINT_INDICES` lists the corners in (edges 2, 3, 6
/// and 7 run downwards). It only matters when both ends lie within
/// [`INTERP_EPSILON`](crate::interp::INTERP_EPSILON) of the iso-level: the crossing then
/// snaps to the lower corner, where interpolating in table order would give the upper one.
#[inline]
pub fn get_edge_points(
    edges_mask: u16,
    corner_positions: &[Point; 8],
    corner_values: &[Value; 8],
    isolevel: Value,
) -> [Option<Point>; 12] {
    let mut edge_points = [None; 12];

    for (edge, point) in edge_points.iter_mut().enumerate() {
        if edges_mask & (1 << edge) == 0 {
            continue;
        }

        let (a, b) = edge_endpoints(edge);
        *point = Some(vertex_interp(
            isolevel,
            corner_positions[a],
            corner_positions[b],
            corner_values[a],
            corner_values[b],
        ));
    }

    edge_points
}

/// Walks `TRI_TABLE[state]`, yielding the three edges of each triangle in winding order.
///
/// ```text
/// TRI_TABLE[state] = [e0, e1, e2,  e3, e4, e5,  -1, ...]
///                     \___tri0__/   \___tri1__/
/// ```
#[inline]
pub fn triangle_edges(state: usize) -> impl Iterator<Item = [usize; 3]> {
    TRI_TABLE[state]
        .chunks_exact(3)
        .take_while(|tri| tri[0] != TRI_END)
        .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
}

/// Triangulates one cell, pairing each vertex with the cell edge it lies on.
///
/// Yields between 0 and 5 triangles, vertices in table order. The edge ids let a caller
/// share vertices between cells.
#[inline]
pub fn polygonise_edges(
    corner_positions: &[Point; 8],
    corner_values: &[Value; 8],
    isolevel: Value,
) -> impl Iterator<Item = [(usize, Point); 3]> {
    let state = get_state(corner_values, isolevel);
    let edges_mask = EDGE_TABLE[state];

    let edge_points = if edges_mask == 0 {
        [None; 12]
    } else {
        get_edge_points(edges_mask, corner_positions, corner_values, isolevel)
    };

    triangle_edges(state).filter_map(move |[a, b, c]| {
        Some([
            (a, edge_points[a]?),
            (b, edge_points[b]?),
            (c, edge_points[c]?),
        ])
    })
}

/// Triangulates the iso-surface inside one cell.
///
/// `corner_positions` and `corner_values` follow the corner numbering of
/// [`tables`](crate::tables). Returns between 0 and 5 triangles, vertices in table order.
pub fn polygonise(
    corner_positions: &[Point; 8],
    corner_values: &[Value; 8],
    isolevel: Value,
) -> Vec<Triangle> {
    polygonise_edges(corner_positions, corner_values, isolevel)
        .map(|tri| tri.map(|(_, p)| p))
        .collect()
}
