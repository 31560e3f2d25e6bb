//! Core data structures for VNA calibration.
//!
//! This crate provides the vocabulary shared by the equation builder and
//! its consumers: error-term types ([`CalType`]), the layout of the unknown
//! error-term coefficients ([`Layout`]), parameter handles and storage
//! ([`ParameterId`], [`ParameterStore`], [`ParameterTable`]) and the
//! argument matrices that describe a calibration standard ([`ArgMatrix`]).

pub mod cal_type;
pub mod config;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod parameter;

pub use cal_type::{CalType, Form};
pub use config::CalibrationConfig;
pub use error::{Error, Result};
pub use layout::{Block, BlockShape, Coefficient, Layout, Leakage, Terms};
pub use matrix::{ArgMatrix, ParameterMatrix, SeriesMatrix, Shape};
pub use parameter::{
    Interpolation, Parameter, ParameterId, ParameterStore, ParameterTable, RATIONAL_ORDER,
    Tabulated,
};
