//! Parameter handles and parameter storage.
//!
//! Reference-standard values are never stored in the calibration itself.
//! Standards refer to them through [`ParameterId`] handles, and their values
//! are looked up through a [`ParameterStore`]. [`ParameterTable`] is the
//! in-memory store used by default.

use std::fmt;

use num_complex::Complex64 as C64;
use vnacal_linalg::{Spline, rfi, spline_calc};

use crate::error::{Error, Result};

/// Number of knots minus one used by rational interpolation.
pub const RATIONAL_ORDER: usize = 3;

/// Handle of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(pub(crate) u32);

impl ParameterId {
    /// The constant 0, also a perfect match.
    pub const ZERO: ParameterId = ParameterId(0);
    /// The constant 1, also an ideal open.
    pub const ONE: ParameterId = ParameterId(1);
    /// The constant -1, also an ideal short.
    pub const MINUS_ONE: ParameterId = ParameterId(2);

    pub const MATCH: ParameterId = ParameterId::ZERO;
    pub const OPEN: ParameterId = ParameterId::ONE;
    pub const SHORT: ParameterId = ParameterId::MINUS_ONE;

    /// Create a handle from a raw value.
    pub fn new(id: u32) -> Self {
        ParameterId(id)
    }

    /// Get the raw handle value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Check if this is the zero constant.
    pub fn is_zero(self) -> bool {
        self == ParameterId::ZERO
    }

    /// Check if this is one of the predefined constants.
    pub fn is_predefined(self) -> bool {
        self.0 <= ParameterId::MINUS_ONE.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParameterId::ZERO => write!(f, "zero"),
            ParameterId::ONE => write!(f, "one"),
            ParameterId::MINUS_ONE => write!(f, "minus-one"),
            ParameterId(n) => write!(f, "#{}", n),
        }
    }
}

/// Source of parameter values.
pub trait ParameterStore {
    /// Frequency range over which `id` is defined, or `None` if it is
    /// defined at every frequency.
    fn frequency_range(&self, id: ParameterId) -> Result<Option<(f64, f64)>>;

    /// Value of `id` at `frequency`.
    ///
    /// Unknown and correlated parameters yield their last solved value and
    /// fail with [`Error::Unsolved`] before they have been solved.
    fn value_at(&self, id: ParameterId, frequency: f64) -> Result<C64>;

    /// True if `id` is solved for by the calibration.
    fn is_unknown(&self, id: ParameterId) -> Result<bool>;
}

/// How a tabulated parameter is evaluated between points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Natural cubic spline.
    #[default]
    Spline,
    /// Rational function through the nearest points.
    Rational,
}

/// Values tabulated over frequency.
#[derive(Debug, Clone)]
pub enum Tabulated {
    Spline(Spline),
    Rational {
        frequencies: Vec<f64>,
        values: Vec<C64>,
    },
}

impl Tabulated {
    /// Fit `values` over `frequencies`.
    pub fn new(frequencies: &[f64], values: &[C64], interpolation: Interpolation) -> Result<Self> {
        // The spline fit validates the knots for both methods.
        let spline = spline_calc(frequencies, values)?;
        Ok(match interpolation {
            Interpolation::Spline => Tabulated::Spline(spline),
            Interpolation::Rational => Tabulated::Rational {
                frequencies: frequencies.to_vec(),
                values: values.to_vec(),
            },
        })
    }

    /// First and last tabulated frequency.
    pub fn range(&self) -> (f64, f64) {
        let f = match self {
            Tabulated::Spline(s) => s.knots(),
            Tabulated::Rational { frequencies, .. } => frequencies.as_slice(),
        };
        (f[0], f[f.len() - 1])
    }

    /// Interpolated value at `frequency`.
    pub fn eval(&self, frequency: f64) -> Result<C64> {
        match self {
            Tabulated::Spline(s) => Ok(s.eval(frequency)),
            Tabulated::Rational {
                frequencies,
                values,
            } => Ok(rfi(frequencies, values, RATIONAL_ORDER, frequency)?),
        }
    }
}

/// A stored parameter.
#[derive(Debug, Clone)]
pub enum Parameter {
    /// Frequency-independent value.
    Scalar(C64),
    /// Value tabulated over frequency.
    Vector(Tabulated),
    /// Value to be solved, seeded from another parameter.
    Unknown {
        initial: ParameterId,
        solved: Option<Tabulated>,
    },
    /// Unknown value expected within `sigma` of another parameter.
    Correlated {
        other: ParameterId,
        sigma: f64,
        solved: Option<Tabulated>,
    },
}

/// In-memory [`ParameterStore`].
#[derive(Debug, Clone)]
pub struct ParameterTable {
    parameters: Vec<Parameter>,
}

impl Default for ParameterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterTable {
    /// Create a table holding only the predefined constants.
    pub fn new() -> Self {
        Self {
            parameters: vec![
                Parameter::Scalar(C64::new(0.0, 0.0)),
                Parameter::Scalar(C64::new(1.0, 0.0)),
                Parameter::Scalar(C64::new(-1.0, 0.0)),
            ],
        }
    }

    /// Number of parameters, including the predefined ones.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn push(&mut self, parameter: Parameter) -> ParameterId {
        let id = ParameterId(self.parameters.len() as u32);
        self.parameters.push(parameter);
        id
    }

    /// Look up a parameter.
    pub fn get(&self, id: ParameterId) -> Result<&Parameter> {
        self.parameters
            .get(id.0 as usize)
            .ok_or(Error::UnknownParameter(id))
    }

    /// Add a frequency-independent parameter.
    pub fn add_scalar(&mut self, value: C64) -> ParameterId {
        self.push(Parameter::Scalar(value))
    }

    /// Add a parameter tabulated over `frequencies`, interpolated by spline.
    pub fn add_vector(&mut self, frequencies: &[f64], values: &[C64]) -> Result<ParameterId> {
        self.add_vector_with(frequencies, values, Interpolation::Spline)
    }

    /// Add a tabulated parameter with the given interpolation.
    pub fn add_vector_with(
        &mut self,
        frequencies: &[f64],
        values: &[C64],
        interpolation: Interpolation,
    ) -> Result<ParameterId> {
        let tabulated = Tabulated::new(frequencies, values, interpolation)?;
        Ok(self.push(Parameter::Vector(tabulated)))
    }

    /// Add an unknown parameter with initial guess `initial`.
    pub fn add_unknown(&mut self, initial: ParameterId) -> Result<ParameterId> {
        self.get(initial)?;
        Ok(self.push(Parameter::Unknown {
            initial,
            solved: None,
        }))
    }

    /// Add an unknown parameter correlated with `other` by standard
    /// deviation `sigma`.
    pub fn add_correlated(&mut self, other: ParameterId, sigma: f64) -> Result<ParameterId> {
        self.get(other)?;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "standard deviation must be finite and non-negative, got {}",
                sigma
            )));
        }
        Ok(self.push(Parameter::Correlated {
            other,
            sigma,
            solved: None,
        }))
    }

    /// Record solved values of an unknown or correlated parameter.
    pub fn set_solved(
        &mut self,
        id: ParameterId,
        frequencies: &[f64],
        values: &[C64],
    ) -> Result<()> {
        let tabulated = Tabulated::new(frequencies, values, Interpolation::Spline)?;
        match self.parameters.get_mut(id.0 as usize) {
            Some(Parameter::Unknown { solved, .. } | Parameter::Correlated { solved, .. }) => {
                log::trace!("parameter {}: {} solved values", id, values.len());
                *solved = Some(tabulated);
                Ok(())
            }
            Some(_) => Err(Error::InvalidParameter(format!(
                "parameter {} is not an unknown",
                id
            ))),
            None => Err(Error::UnknownParameter(id)),
        }
    }

    /// Starting value for solving `id` at `frequency`.
    ///
    /// Unknown parameters start from their initial guess and correlated
    /// parameters from the parameter they track. Known parameters return
    /// their value.
    pub fn initial_value(&self, id: ParameterId, frequency: f64) -> Result<C64> {
        match self.get(id)? {
            Parameter::Unknown { initial, .. } => self.value_at(*initial, frequency),
            Parameter::Correlated { other, .. } => self.value_at(*other, frequency),
            _ => self.value_at(id, frequency),
        }
    }
}

impl ParameterStore for ParameterTable {
    fn frequency_range(&self, id: ParameterId) -> Result<Option<(f64, f64)>> {
        match self.get(id)? {
            Parameter::Scalar(_) => Ok(None),
            Parameter::Vector(t) => Ok(Some(t.range())),
            Parameter::Unknown { initial, .. } => self.frequency_range(*initial),
            Parameter::Correlated { other, .. } => self.frequency_range(*other),
        }
    }

    fn value_at(&self, id: ParameterId, frequency: f64) -> Result<C64> {
        match self.get(id)? {
            Parameter::Scalar(v) => Ok(*v),
            Parameter::Vector(t) => t.eval(frequency),
            Parameter::Unknown { solved, .. } | Parameter::Correlated { solved, .. } => solved
                .as_ref()
                .ok_or(Error::Unsolved(id))?
                .eval(frequency),
        }
    }

    fn is_unknown(&self, id: ParameterId) -> Result<bool> {
        Ok(matches!(
            self.get(id)?,
            Parameter::Unknown { .. } | Parameter::Correlated { .. }
        ))
    }
}
