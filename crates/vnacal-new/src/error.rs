//! Error types for vnacal-new.

use std::collections::TryReserveError;

use thiserror::Error;
use vnacal_core::{CalType, ParameterId};

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Arguments inconsistent with the calibration or with each other.
    Usage,
    /// Resource exhaustion.
    System,
    /// Numerical failure on the supplied data.
    Math,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{function}: {message}")]
    Usage {
        function: &'static str,
        message: String,
    },

    #[error("{function}: {cal_type} calibration needs a fully known S matrix; use a {suggestion} standard")]
    NeedFullS {
        function: &'static str,
        cal_type: CalType,
        suggestion: &'static str,
    },

    #[error("{function}: A matrix is singular at frequency index {findex}")]
    SingularMatrix {
        function: &'static str,
        findex: usize,
    },

    #[error("{function}: parameter {id}: {source}")]
    Parameter {
        function: &'static str,
        id: ParameterId,
        #[source]
        source: vnacal_core::Error,
    },

    #[error(
        "{function}: parameter {id} is defined from {low} to {high} Hz, which does not cover {fmin} to {fmax} Hz"
    )]
    FrequencyRange {
        function: &'static str,
        id: ParameterId,
        low: f64,
        high: f64,
        fmin: f64,
        fmax: f64,
    },

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    #[error(transparent)]
    Core(#[from] vnacal_core::Error),

    #[error(transparent)]
    Linalg(#[from] vnacal_linalg::Error),
}

impl Error {
    pub(crate) fn usage(function: &'static str, message: impl Into<String>) -> Self {
        Error::Usage {
            function,
            message: message.into(),
        }
    }

    /// Class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Allocation(_) => ErrorKind::System,
            Error::SingularMatrix { .. } | Error::Linalg(vnacal_linalg::Error::SingularMatrix) => {
                ErrorKind::Math
            }
            Error::Linalg(vnacal_linalg::Error::Pole { .. }) => ErrorKind::Math,
            Error::Parameter { source, .. } | Error::Core(source) => match source {
                vnacal_core::Error::Linalg(
                    vnacal_linalg::Error::SingularMatrix | vnacal_linalg::Error::Pole { .. },
                ) => ErrorKind::Math,
                _ => ErrorKind::Usage,
            },
            _ => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::usage("f", "bad").kind(), ErrorKind::Usage);
        assert_eq!(
            Error::SingularMatrix {
                function: "f",
                findex: 3
            }
            .kind(),
            ErrorKind::Math
        );
        assert_eq!(
            Error::NeedFullS {
                function: "f",
                cal_type: CalType::T16,
                suggestion: "double reflect"
            }
            .kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            Error::from(vnacal_linalg::Error::Pole { x: 1.0 }).kind(),
            ErrorKind::Math
        );
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        assert_eq!(Error::from(err).kind(), ErrorKind::System);
    }

    #[test]
    fn messages() {
        let e = Error::SingularMatrix {
            function: "add_through",
            findex: 4,
        };
        assert_eq!(e.to_string(), "add_through: A matrix is singular at frequency index 4");
        let e = Error::NeedFullS {
            function: "add_single_reflect",
            cal_type: CalType::U16,
            suggestion: "double reflect",
        };
        assert_eq!(
            e.to_string(),
            "add_single_reflect: U16 calibration needs a fully known S matrix; use a double reflect standard"
        );
    }
}
