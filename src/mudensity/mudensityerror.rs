use thiserror::Error;

use super::leafpair::Leaf;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MuDensityError {
    #[error("time steps must be at least 1, got {0}")]
    InvalidTimeSteps(usize),

    #[error("grid resolution must be a positive finite number, got {0}")]
    InvalidGridResolution(f64),

    #[error("{leaf} leaf needs exactly two positions (start, end), got {found}")]
    InvalidPositionCount { leaf: Leaf, found: usize },

    #[error("{leaf} leaf position is not a finite number")]
    NonFinitePosition { leaf: Leaf },

    #[error("grid of {cells} cells exceeds the cell limit")]
    GridTooLarge { cells: f64 },

    #[error("delivered MU must be a non-negative finite number, got {0}")]
    InvalidDeliveredMu(f64),
}
