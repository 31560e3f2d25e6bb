//! Error types for vnacal-linalg.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("singular matrix")]
    SingularMatrix,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("empty input")]
    EmptyInput,

    #[error("knots must be strictly increasing: x[{index}] is too close to its predecessor")]
    InvalidKnots { index: usize },

    #[error("interpolant has a pole at x = {x}")]
    Pole { x: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
