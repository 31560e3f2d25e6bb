//! Error types for vnacal-core.

use thiserror::Error;

use crate::parameter::ParameterId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown calibration type: {0}")]
    UnknownCalType(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(ParameterId),

    #[error("parameter {0} has not been solved")]
    Unsolved(ParameterId),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Linalg(#[from] vnacal_linalg::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
