//! # vnacal
//!
//! Vector network analyzer calibration.
//!
//! vnacal turns measurements of known reference standards into linear
//! equations in a VNA's error terms:
//! - Error-term models T8, U8, TE10, UE10, T16, U16, UE14 and E12
//! - Standard parameters: scalars, frequency tables, unknowns
//! - Single and double reflects, throughs, lines and arbitrary mapped standards
//! - Dense complex kernels for division, least squares and interpolation
//!
//! ## Quick Start
//!
//! ```rust
//! use vnacal::prelude::*;
//!
//! let frequencies = vec![1.0e9, 2.0e9, 3.0e9];
//! let mut cal = NewCalibration::new(CalType::TE10, 2, 2, frequencies, ParameterTable::new())?;
//!
//! // Short on port 1, open on port 2, measured together.
//! let b = SeriesMatrix::diagonal(vec![
//!     vec![Complex::new(-0.98, 0.01); 3],
//!     vec![Complex::new(0.97, -0.02); 3],
//! ]);
//! cal.add_double_reflect(None, &b, ParameterId::SHORT, ParameterId::OPEN, 1, 2)?;
//!
//! // A through between the same ports.
//! let b = SeriesMatrix::from_fn(2, 2, |i, j| {
//!     vec![if i == j { Complex::new(0.02, 0.0) } else { Complex::new(0.9, -0.3) }; 3]
//! });
//! cal.add_through(None, &b, 1, 2)?;
//!
//! assert_eq!(cal.standards().len(), 2);
//! # Ok::<(), vnacal::Error>(())
//! ```

// Re-export member crates
pub use vnacal_core as core;
pub use vnacal_linalg as linalg;
pub use vnacal_new as new;

// ============================================================================
// Convenient re-exports from vnacal_core
// ============================================================================

pub use vnacal_core::{
    ArgMatrix,
    // Layout of the unknowns
    Block,
    BlockShape,
    // Error-term models
    CalType,
    // Settings
    CalibrationConfig,
    Coefficient,
    // Errors
    Error as CoreError,
    Form,
    Interpolation,
    Layout,
    Leakage,
    Parameter,
    // Parameters
    ParameterId,
    // Argument matrices
    ParameterMatrix,
    ParameterStore,
    ParameterTable,
    SeriesMatrix,
    Shape,
    Terms,
};

// ============================================================================
// Convenient re-exports from vnacal_new
// ============================================================================

pub use vnacal_new::{
    Cell,
    Connectivity,
    Equation,
    EquationKind,
    EquationRef,
    // Errors
    Error,
    ErrorKind,
    Measurement,
    // Session
    NewCalibration,
    Result,
    StandardKind,
    System,
    Term,
};

// ============================================================================
// Convenient re-exports from vnacal_linalg
// ============================================================================

pub use vnacal_linalg::{
    // Errors
    Error as LinalgError,
    // Factorizations
    Lu,
    Qrd,
    // Interpolation
    Spline,
    minverse,
    mldivide,
    mrdivide,
    qrsolve,
    rfi,
    spline_calc,
};

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of num_complex's Complex type.
pub use num_complex::Complex;

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use vnacal::prelude::*;
/// ```
pub mod prelude {
    // Error-term models
    pub use crate::{CalType, Layout};

    // Parameters
    pub use crate::{Interpolation, ParameterId, ParameterStore, ParameterTable};

    // Standards and equations
    pub use crate::{
        Equation, EquationKind, NewCalibration, ParameterMatrix, SeriesMatrix, StandardKind,
    };

    // Errors
    pub use crate::{Error, ErrorKind};

    // Common external types
    pub use crate::{Complex, DMatrix};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let layout = Layout::new(CalType::T8, 2, 2).unwrap();
        assert_eq!(layout.total_unknowns(), 7);

        let mut table = ParameterTable::new();
        let id = table.add_scalar(Complex::new(0.5, 0.0));
        assert!(!id.is_predefined());
        assert_eq!(table.value_at(ParameterId::MATCH, 1.0e9).unwrap(), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_cal_type_round_trip_through_names() {
        for cal_type in CalType::ALL {
            assert_eq!(cal_type.to_string().parse::<CalType>().unwrap(), cal_type);
        }
    }

    #[test]
    fn test_error_kinds_visible() {
        let err =
            NewCalibration::new(CalType::U8, 2, 2, vec![], ParameterTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
