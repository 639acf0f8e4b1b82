use crate::types::{Point, Triangle, Vector};

/// Indexed triangle mesh produced by the marching cubes builder.
///
/// `normals` is index-aligned with `vertices`; every group of three consecutive `indices`
/// forms one triangle. With [`VertexSharing::Soup`](crate::builder::VertexSharing::Soup) each
/// triangle owns its three vertices, so the indices simply count up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarchMesh {
    /// Vertex positions, in emission order.
    pub vertices: Vec<Point>,

    /// Unit vertex normals, one per vertex.
    pub normals: Vec<Vector>,

    /// Triangle list into `vertices`, stride 3.
    pub indices: Vec<u32>,
}

impl MarchMesh {
    /// Creates an empty mesh with no vertices, triangles, or normals.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// `true` when no triangle was emitted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `tri`.
    pub fn tri_indices(&self, tri: usize) -> [usize; 3] {
        let i = &self.indices[tri * 3..tri * 3 + 3];
        [i[0] as usize, i[1] as usize, i[2] as usize]
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> Triangle {
        self.tri_indices(tri).map(|i| self.vertices[i])
    }

    /// Iterates triangles as position triples, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.triangle_count()).map(|tri| self.tri_coords(tri))
    }

    /// Computes the face normal for triangle `tri` from its winding.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn tri_normal(&self, tri: usize) -> Vector {
        let [a, b, c] = self.tri_coords(tri);
        let cross = (b - a).cross(&(c - b));
        cross.try_normalize(0.0).unwrap_or_else(Vector::zeros)
    }
}
