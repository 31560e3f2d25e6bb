//! Calibration standards and equation construction.
//!
//! A [`NewCalibration`] collects measurements of reference standards. Each
//! standard is validated against the calibration's error-term layout, mapped
//! onto the VNA's ports and turned into linear equations in the unknown
//! error terms. A downstream solver consumes the equations per [`System`].
//!
//! # Example
//!
//! ```
//! use num_complex::Complex64 as C64;
//! use vnacal_core::{CalType, ParameterId, ParameterTable};
//! use vnacal_new::NewCalibration;
//!
//! let frequencies = vec![1.0e9, 2.0e9];
//! let mut cal =
//!     NewCalibration::new(CalType::T8, 2, 2, frequencies, ParameterTable::new()).unwrap();
//!
//! let measured = vec![C64::new(-0.9, 0.1), C64::new(-0.8, 0.2)];
//! cal.add_single_reflect(None, &measured, ParameterId::SHORT, 1).unwrap();
//!
//! assert_eq!(cal.systems()[0].len(), 1);
//! ```

mod builder;
pub mod connectivity;
pub mod equation;
pub mod error;
pub mod measurement;
pub mod session;
mod standards;

pub use connectivity::Connectivity;
pub use equation::{Cell, Equation, EquationKind, Term};
pub use error::{Error, ErrorKind, Result};
pub use measurement::{Measurement, StandardKind};
pub use session::{EquationRef, NewCalibration, System};
