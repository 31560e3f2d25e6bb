//! Error-term topologies.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Error-term model of a calibration.
///
/// The 8- and 16-term types exist in scattering-transfer (`T`) and
/// inverse-scattering-transfer (`U`) form. `TE10` and `UE10` add leakage
/// terms to the 8-term model; `UE14` models each driver column as an
/// independent 1×N calibration. `E12` is the classic 12-term model, which is
/// solved through the `UE14` equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalType {
    T8,
    U8,
    TE10,
    UE10,
    T16,
    U16,
    UE14,
    E12,
}

/// Algebraic form of the per-cell equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// `Ts·S + Ti = M·Tx·S + M·Tm`
    T,
    /// `Um·M + Ui = S·Ux·M + S·Us`
    U,
}

impl CalType {
    /// All supported types, in declaration order.
    pub const ALL: [CalType; 8] = [
        CalType::T8,
        CalType::U8,
        CalType::TE10,
        CalType::UE10,
        CalType::T16,
        CalType::U16,
        CalType::UE14,
        CalType::E12,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            CalType::T8 => "T8",
            CalType::U8 => "U8",
            CalType::TE10 => "TE10",
            CalType::UE10 => "UE10",
            CalType::T16 => "T16",
            CalType::U16 => "U16",
            CalType::UE14 => "UE14",
            CalType::E12 => "E12",
        }
    }

    /// Form of the equations this type generates.
    pub fn form(self) -> Form {
        match self {
            CalType::T8 | CalType::TE10 | CalType::T16 => Form::T,
            CalType::U8 | CalType::UE10 | CalType::U16 | CalType::UE14 | CalType::E12 => Form::U,
        }
    }

    /// True for the scattering-transfer (`T`) types.
    pub fn is_transfer(self) -> bool {
        self.form() == Form::T
    }

    /// True if the model carries explicit leakage unknowns.
    pub fn has_leakage_terms(self) -> bool {
        matches!(
            self,
            CalType::TE10 | CalType::UE10 | CalType::UE14 | CalType::E12
        )
    }

    /// True for the 16-term types, which need a fully known S matrix and
    /// absorb leakage into the linear system.
    pub fn is_full(self) -> bool {
        matches!(self, CalType::T16 | CalType::U16)
    }

    /// True if each driver column is solved as its own system.
    pub fn is_per_column(self) -> bool {
        matches!(self, CalType::UE14 | CalType::E12)
    }

    /// Type whose equations are generated for this type.
    pub fn equation_type(self) -> CalType {
        match self {
            CalType::E12 => CalType::UE14,
            other => other,
        }
    }
}

impl fmt::Display for CalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CalType::ALL
            .into_iter()
            .find(|t| t.name() == upper)
            .ok_or_else(|| Error::UnknownCalType(s.to_string()))
    }
}
