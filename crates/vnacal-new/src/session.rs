//! Calibration session collecting standards and their equations.

use num_complex::Complex64 as C64;
use vnacal_core::{
    CalType, CalibrationConfig, Layout, ParameterMatrix, ParameterStore, ParameterTable,
    SeriesMatrix,
};

use crate::builder::{Context, StandardArgs, build};
use crate::equation::Equation;
use crate::error::{Error, Result};
use crate::measurement::{Measurement, StandardKind};

/// Position of an equation: standard index and index within the standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquationRef {
    pub standard: usize,
    pub equation: usize,
}

/// Equations sharing one vector of unknown coefficients.
#[derive(Debug, Clone, Default)]
pub struct System {
    equations: Vec<EquationRef>,
}

impl System {
    /// Equations of this system in the order they were added.
    pub fn equations(&self) -> &[EquationRef] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }
}

/// A calibration under construction.
///
/// Standards are added one at a time. Each accepted standard is kept along
/// with the equations it contributes; a rejected standard leaves the
/// session unchanged.
#[derive(Debug, Clone)]
pub struct NewCalibration<P = ParameterTable> {
    layout: Layout,
    equation_layout: Layout,
    frequencies: Vec<f64>,
    store: P,
    config: CalibrationConfig,
    standards: Vec<Measurement>,
    systems: Vec<System>,
}

impl<P: ParameterStore> NewCalibration<P> {
    /// Start a `cal_type` calibration of an `m_rows × m_columns` VNA over
    /// `frequencies`, with parameters looked up in `store`.
    pub fn new(
        cal_type: CalType,
        m_rows: usize,
        m_columns: usize,
        frequencies: Vec<f64>,
        store: P,
    ) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::usage("new", "frequency vector is empty"));
        }
        if let Some(f) = frequencies.iter().find(|f| !f.is_finite()) {
            return Err(Error::usage("new", format!("frequency {} is not finite", f)));
        }
        if let Some(k) = (1..frequencies.len()).find(|&k| frequencies[k] <= frequencies[k - 1]) {
            return Err(Error::usage(
                "new",
                format!("frequencies must be strictly increasing at index {}", k),
            ));
        }

        let layout = Layout::new(cal_type, m_rows, m_columns)?;
        let equation_layout = layout.equations();
        let systems = vec![System::default(); equation_layout.systems()];
        Ok(Self {
            layout,
            equation_layout,
            frequencies,
            store,
            config: CalibrationConfig::default(),
            standards: Vec::new(),
            systems,
        })
    }

    /// Replace the session settings.
    pub fn with_config(mut self, config: CalibrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Layout of the calibration's error terms.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Layout the equations are generated with.
    pub fn equation_layout(&self) -> &Layout {
        &self.equation_layout
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut P {
        &mut self.store
    }

    /// Accepted standards in the order they were added.
    pub fn standards(&self) -> &[Measurement] {
        &self.standards
    }

    /// Equation systems, one per independent set of unknowns.
    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    /// Resolve an equation reference.
    pub fn equation(&self, r: EquationRef) -> Option<(&Measurement, &Equation)> {
        let measurement = self.standards.get(r.standard)?;
        let equation = measurement.equations.get(r.equation)?;
        Some((measurement, equation))
    }

    /// Add a standard.
    ///
    /// `b` holds the raw measurements, or M itself when `a` is `None`;
    /// otherwise `M = B·A⁻¹` per frequency. `s` gives the standard's
    /// parameters in port-map order. `port_map` assigns the standard's
    /// ports to VNA ports, 1-based; without one the standard occupies
    /// ports `1..=n`. Returns the index of the new standard.
    pub fn add_common(
        &mut self,
        kind: StandardKind,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        s: &ParameterMatrix,
        port_map: Option<&[usize]>,
    ) -> Result<usize> {
        let ctx = Context {
            layout: &self.equation_layout,
            frequencies: &self.frequencies,
            store: &self.store,
            config: &self.config,
        };
        let args = StandardArgs {
            kind,
            a,
            b,
            s,
            port_map,
        };
        let measurement = build(&ctx, &args)?;

        // Reserve first so that linking cannot fail partway.
        let mut counts = vec![0usize; self.systems.len()];
        for equation in &measurement.equations {
            counts[equation.system] += 1;
        }
        for (system, count) in self.systems.iter_mut().zip(counts) {
            system.equations.try_reserve(count)?;
        }
        self.standards.try_reserve(1)?;

        let index = self.standards.len();
        for (k, equation) in measurement.equations.iter().enumerate() {
            self.systems[equation.system].equations.push(EquationRef {
                standard: index,
                equation: k,
            });
        }
        let count = measurement.equations.len();
        self.standards.push(measurement);

        if count == 0 {
            log::warn!(
                "{}: standard {} ({}) contributes no equations",
                kind.function(),
                index,
                kind
            );
        } else {
            log::debug!(
                "{}: standard {} ({}) accepted with {} equations",
                kind.function(),
                index,
                kind,
                count
            );
        }
        Ok(index)
    }

    /// Residuals of every equation of `system` at frequency index `findex`
    /// for coefficient vector `x`.
    pub fn residuals(&self, system: usize, findex: usize, x: &[C64]) -> Result<Vec<C64>> {
        let equations = self.systems.get(system).ok_or_else(|| {
            Error::usage(
                "residuals",
                format!("system {} out of range 0..{}", system, self.systems.len()),
            )
        })?;
        let frequency = *self.frequencies.get(findex).ok_or_else(|| {
            Error::usage("residuals", format!("frequency index {} out of range", findex))
        })?;

        let mut residuals = Vec::with_capacity(equations.len());
        for &r in equations.equations() {
            let measurement = &self.standards[r.standard];
            let equation = &measurement.equations[r.equation];
            residuals.push(equation.evaluate(measurement, findex, x, |id| {
                self.store.value_at(id, frequency)
            })?);
        }
        Ok(residuals)
    }
}
