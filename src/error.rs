use derive_more::Display;

use crate::types::Value;

pub type Result<T> = core::result::Result<T, MarchingCubesError>;

#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum MarchingCubesError {
    /// The grid needs at least one cell per axis, and its vertex lattice must fit in memory.
    #[display("grid resolution must be at least 1 and fit in memory, got {resolution}")]
    InvalidResolution { resolution: usize },

    /// The sampled region's edge length must be positive and finite.
    #[display("field size must be positive and finite, got {size}")]
    InvalidFieldSize { size: Value },

    /// A smooth-min blend radius must be positive and finite.
    #[display("blend radius must be positive and finite, got {k}")]
    InvalidBlendRadius { k: Value },

    /// The finite-difference step used for normals must be positive and finite.
    #[display("normal epsilon must be positive and finite, got {epsilon}")]
    InvalidEpsilon { epsilon: Value },

    /// The field returned NaN or infinity at a grid vertex.
    #[display("field returned {value} at grid vertex ({x}, {y}, {z})")]
    NonFiniteSample {
        x: usize,
        y: usize,
        z: usize,
        value: Value,
    },

    /// The mesh has more vertices than a `u32` index can address.
    #[display("mesh has {vertices} vertices, more than u32 indices can address")]
    MeshTooLarge { vertices: usize },
}

impl std::error::Error for MarchingCubesError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = MarchingCubesError::InvalidResolution { resolution: 0 };
        assert_eq!(err.to_string(), "grid resolution must be at least 1 and fit in memory, got 0");

        let err = MarchingCubesError::NonFiniteSample {
            x: 1,
            y: 2,
            z: 3,
            value: Value::NAN,
        };
        assert_eq!(err.to_string(), "field returned NaN at grid vertex (1, 2, 3)");
    }
}
