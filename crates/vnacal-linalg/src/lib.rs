//! Dense complex matrix kernels for VNA calibration.
//!
//! This crate provides:
//! - LU decomposition with partial pivoting ([`lu`], [`Lu`])
//! - Matrix left/right division and inversion ([`mldivide`], [`mrdivide`], [`minverse`])
//! - Householder QR and QR-based least-squares / underdetermined solvers
//! - Natural cubic spline and rational function interpolation
//!
//! All matrices are [`nalgebra::DMatrix`] of [`num_complex::Complex64`].
//! Kernels that need scratch space consume their input matrix.

pub mod error;
pub mod linear;
pub mod lu;
pub mod qr;
pub mod rfi;
pub mod spline;

pub use error::{Error, Result};
pub use linear::{minverse, mldivide, mmultiply, mrdivide};
pub use lu::{Lu, SINGULAR_TOLERANCE, lu};
pub use qr::{QrSolution, Qrd, qr, qrd, qrsolve, qrsolve_q, qrsolve2};
pub use rfi::rfi;
pub use spline::{MIN_KNOT_SPACING, Spline, spline_calc, spline_eval};
