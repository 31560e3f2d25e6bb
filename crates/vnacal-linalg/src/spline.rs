//! Natural cubic spline interpolation of complex values over real knots.
//!
//! The spline has zero second derivative at both end knots. Outside the knot
//! range it extrapolates linearly along the tangent of the boundary segment.
//! A single knot degenerates to a constant function.

use num_complex::Complex64 as C64;

use crate::error::{Error, Result};

/// Smallest allowed knot spacing, relative to the knot magnitude.
pub const MIN_KNOT_SPACING: f64 = 1.0e-12;

/// Fitted natural cubic spline.
#[derive(Debug, Clone)]
pub struct Spline {
    x: Vec<f64>,
    y: Vec<C64>,
    /// Second derivative at each knot.
    m: Vec<C64>,
}

/// Fit a natural cubic spline through `(x[i], y[i])`.
///
/// `x` must be strictly increasing with spacing of at least
/// [`MIN_KNOT_SPACING`] relative to the larger neighbouring knot.
pub fn spline_calc(x: &[f64], y: &[C64]) -> Result<Spline> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    if x.is_empty() {
        return Err(Error::EmptyInput);
    }
    for i in 1..x.len() {
        let tol = MIN_KNOT_SPACING * x[i].abs().max(x[i - 1].abs()).max(1.0);
        if !(x[i] - x[i - 1] > tol) {
            return Err(Error::InvalidKnots { index: i });
        }
    }

    let n = x.len();
    let mut m = vec![C64::new(0.0, 0.0); n];
    if n > 2 {
        // Tridiagonal system for the interior second derivatives, solved by
        // the Thomas algorithm.
        let k = n - 2;
        let mut diag = vec![0.0; k];
        let mut upper = vec![0.0; k];
        let mut rhs = vec![C64::new(0.0, 0.0); k];
        for i in 1..n - 1 {
            let h0 = x[i] - x[i - 1];
            let h1 = x[i + 1] - x[i];
            diag[i - 1] = 2.0 * (h0 + h1);
            upper[i - 1] = h1;
            rhs[i - 1] = ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0) * 6.0;
        }
        for i in 1..k {
            let lower = x[i + 1] - x[i];
            let w = lower / diag[i - 1];
            diag[i] -= w * upper[i - 1];
            let prev = rhs[i - 1];
            rhs[i] -= prev * w;
        }
        m[k] = rhs[k - 1] / diag[k - 1];
        for i in (0..k - 1).rev() {
            m[i + 1] = (rhs[i] - m[i + 2] * upper[i]) / diag[i];
        }
    }

    Ok(Spline {
        x: x.to_vec(),
        y: y.to_vec(),
        m,
    })
}

/// Evaluate `spline` at `x`.
pub fn spline_eval(spline: &Spline, x: f64) -> C64 {
    spline.eval(x)
}

impl Spline {
    /// Knot positions.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Knot values.
    pub fn values(&self) -> &[C64] {
        &self.y
    }

    /// Evaluate the spline, extrapolating linearly outside the knots.
    pub fn eval(&self, x: f64) -> C64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        if x < self.x[0] {
            return self.y[0] + self.slope_at_start() * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.y[n - 1] + self.slope_at_end() * (x - self.x[n - 1]);
        }

        // Segment i such that x[i] <= x <= x[i+1].
        let i = self
            .x
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(n - 2);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - x) / h;
        let b = (x - self.x[i]) / h;
        self.y[i] * a
            + self.y[i + 1] * b
            + (self.m[i] * (a * a * a - a) + self.m[i + 1] * (b * b * b - b)) * (h * h / 6.0)
    }

    /// Derivative at the first knot.
    fn slope_at_start(&self) -> C64 {
        let h = self.x[1] - self.x[0];
        (self.y[1] - self.y[0]) / h - (self.m[0] * 2.0 + self.m[1]) * (h / 6.0)
    }

    /// Derivative at the last knot.
    fn slope_at_end(&self) -> C64 {
        let n = self.x.len();
        let h = self.x[n - 1] - self.x[n - 2];
        (self.y[n - 1] - self.y[n - 2]) / h + (self.m[n - 2] + self.m[n - 1] * 2.0) * (h / 6.0)
    }
}
