//! Linear equations relating error terms, measurements and parameters.

use std::fmt;

use num_complex::Complex64 as C64;
use vnacal_core::ParameterId;

use crate::error::{Error, Result};
use crate::measurement::Measurement;

/// Position in the full-size M or S matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
}

impl Cell {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// One signed product in an equation.
///
/// The value of a term is the product of its unknown coefficient (1 when
/// `coefficient` is `None`), the measured value at `measured` less the
/// leakage unknown `leakage`, and the parameter at `parameter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub coefficient: Option<usize>,
    pub negative: bool,
    pub measured: Option<Cell>,
    pub leakage: Option<usize>,
    pub parameter: Option<Cell>,
}

/// What an equation constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationKind {
    /// Error-term model at one cell of the equation grid.
    ErrorTerm,
    /// Leakage between two unconnected ports.
    Leakage,
}

/// `Σ terms = 0` for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub row: usize,
    pub column: usize,
    pub system: usize,
    pub kind: EquationKind,
    pub terms: Vec<Term>,
}

impl Term {
    fn value<F>(
        &self,
        measurement: &Measurement,
        findex: usize,
        x: &[C64],
        parameter: &mut F,
    ) -> Result<C64>
    where
        F: FnMut(ParameterId) -> vnacal_core::Result<C64>,
    {
        let unknown = |k: usize| {
            x.get(k).copied().ok_or_else(|| {
                Error::usage(
                    "evaluate",
                    format!("coefficient {} outside vector of length {}", k, x.len()),
                )
            })
        };

        let mut v = match self.coefficient {
            Some(k) => unknown(k)?,
            None => C64::new(1.0, 0.0),
        };
        if let Some(cell) = self.measured {
            let mut m = measurement.m_value(cell, findex)?;
            if let Some(l) = self.leakage {
                m -= unknown(l)?;
            }
            v *= m;
        }
        if let Some(cell) = self.parameter {
            let id = measurement.s(cell).ok_or_else(|| {
                Error::usage(
                    "evaluate",
                    format!("S{}{} is not known", cell.row + 1, cell.column + 1),
                )
            })?;
            v *= parameter(id).map_err(|source| Error::Parameter {
                function: "evaluate",
                id,
                source,
            })?;
        }
        Ok(if self.negative { -v } else { v })
    }
}

impl Equation {
    /// Residual of the equation at frequency index `findex`.
    ///
    /// `x` is the coefficient vector of the equation's system and
    /// `parameter` supplies parameter values at that frequency.
    pub fn evaluate<F>(
        &self,
        measurement: &Measurement,
        findex: usize,
        x: &[C64],
        mut parameter: F,
    ) -> Result<C64>
    where
        F: FnMut(ParameterId) -> vnacal_core::Result<C64>,
    {
        let mut sum = C64::new(0.0, 0.0);
        for term in &self.terms {
            sum += term.value(measurement, findex, x, &mut parameter)?;
        }
        Ok(sum)
    }

    /// Terms whose coefficient is fixed to 1.
    pub fn fixed_terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(|t| t.coefficient.is_none())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factors = Vec::new();
        if let Some(k) = self.coefficient {
            factors.push(format!("x{}", k));
        }
        if let Some(c) = self.measured {
            match self.leakage {
                Some(l) => factors.push(format!("(m{}{}-x{})", c.row + 1, c.column + 1, l)),
                None => factors.push(format!("m{}{}", c.row + 1, c.column + 1)),
            }
        }
        if let Some(c) = self.parameter {
            factors.push(format!("s{}{}", c.row + 1, c.column + 1));
        }
        if factors.is_empty() {
            factors.push("1".to_string());
        }
        write!(
            f,
            "{} {}",
            if self.negative { '-' } else { '+' },
            factors.join("*")
        )
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            EquationKind::ErrorTerm => "e",
            EquationKind::Leakage => "l",
        };
        write!(f, "{}{}{}:", tag, self.row + 1, self.column + 1)?;
        for term in &self.terms {
            write!(f, " {}", term)?;
        }
        Ok(())
    }
}
