//! Accepted calibration standards.

use std::fmt;

use num_complex::Complex64 as C64;
use vnacal_core::ParameterId;

use crate::connectivity::Connectivity;
use crate::equation::{Cell, Equation};
use crate::error::{Error, Result};

/// How a standard was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardKind {
    SingleReflect,
    DoubleReflect,
    Through,
    Line,
    Matrix,
    MappedMatrix,
}

impl StandardKind {
    /// Name of the session method that adds this kind of standard.
    pub fn function(self) -> &'static str {
        match self {
            StandardKind::SingleReflect => "add_single_reflect",
            StandardKind::DoubleReflect => "add_double_reflect",
            StandardKind::Through => "add_through",
            StandardKind::Line => "add_line",
            StandardKind::Matrix => "add_matrix",
            StandardKind::MappedMatrix => "add_mapped_matrix",
        }
    }

    /// Standard to suggest when a 16-term calibration rejects this one
    /// for leaving S cells unknown.
    pub(crate) fn full_s_suggestion(self) -> &'static str {
        match self {
            StandardKind::SingleReflect => "double reflect",
            _ => "mapped matrix spanning all ports",
        }
    }
}

impl fmt::Display for StandardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StandardKind::SingleReflect => "single reflect",
            StandardKind::DoubleReflect => "double reflect",
            StandardKind::Through => "through",
            StandardKind::Line => "line",
            StandardKind::Matrix => "matrix",
            StandardKind::MappedMatrix => "mapped matrix",
        };
        write!(f, "{}", name)
    }
}

/// A standard mapped onto the full port set, with its equations.
///
/// `M` is `m_rows × m_columns` and `S` is `s_ports × s_ports`, both in VNA
/// port order. Cells the standard did not supply are `None`.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub(crate) kind: StandardKind,
    pub(crate) ports: Vec<usize>,
    pub(crate) m_rows: usize,
    pub(crate) m_columns: usize,
    pub(crate) s_ports: usize,
    pub(crate) m: Vec<Option<Vec<C64>>>,
    pub(crate) s: Vec<Option<ParameterId>>,
    pub(crate) connectivity: Option<Connectivity>,
    pub(crate) equations: Vec<Equation>,
}

impl Measurement {
    pub fn kind(&self) -> StandardKind {
        self.kind
    }

    /// VNA ports (0-based) occupied by the standard, in port-map order.
    pub fn ports(&self) -> &[usize] {
        &self.ports
    }

    pub fn m_rows(&self) -> usize {
        self.m_rows
    }

    pub fn m_columns(&self) -> usize {
        self.m_columns
    }

    pub fn s_ports(&self) -> usize {
        self.s_ports
    }

    /// Measured series at (`row`, `column`), if supplied.
    pub fn m(&self, row: usize, column: usize) -> Option<&[C64]> {
        if row >= self.m_rows || column >= self.m_columns {
            return None;
        }
        self.m[row * self.m_columns + column].as_deref()
    }

    /// True if M cell (`row`, `column`) was measured.
    pub fn is_measured(&self, row: usize, column: usize) -> bool {
        self.m(row, column).is_some()
    }

    /// Parameter at S cell `cell`, if known.
    pub fn s(&self, cell: Cell) -> Option<ParameterId> {
        if cell.row >= self.s_ports || cell.column >= self.s_ports {
            return None;
        }
        self.s[cell.row * self.s_ports + cell.column]
    }

    pub(crate) fn m_value(&self, cell: Cell, findex: usize) -> Result<C64> {
        self.m(cell.row, cell.column)
            .and_then(|series| series.get(findex).copied())
            .ok_or_else(|| {
                Error::usage(
                    "evaluate",
                    format!(
                        "M{}{} has no value at frequency index {}",
                        cell.row + 1,
                        cell.column + 1,
                        findex
                    ),
                )
            })
    }

    /// Port reachability; `None` for 16-term calibrations.
    pub fn connectivity(&self) -> Option<&Connectivity> {
        self.connectivity.as_ref()
    }

    /// Equations generated from this standard.
    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }
}
