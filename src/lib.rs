pub mod builder;
pub mod error;
pub mod grid;
pub mod interp;
pub mod mesh;
pub mod normals;
pub mod polygonise;
pub mod scenes;
pub mod sdf;
pub mod tables;
pub mod types;

pub use builder::{MarchingCubesConfig, MeshBuilder, build_mesh};
pub use error::{MarchingCubesError, Result};
pub use mesh::MarchMesh;
