//! Calibration settings.

/// Settings for building a calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Fraction by which the calibration frequencies may extend past the
    /// frequency range of a tabulated parameter.
    pub frequency_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frequency_tolerance: 0.01,
        }
    }
}

impl CalibrationConfig {
    /// Set the frequency tolerance.
    pub fn with_frequency_tolerance(mut self, tolerance: f64) -> Self {
        self.frequency_tolerance = tolerance;
        self
    }

    /// True if a parameter defined over `range` may be evaluated from
    /// `fmin` to `fmax`.
    pub fn covers(&self, range: (f64, f64), fmin: f64, fmax: f64) -> bool {
        let (lo, hi) = range;
        let slack = self.frequency_tolerance;
        fmin >= lo * (1.0 - slack) && fmax <= hi * (1.0 + slack)
    }
}
