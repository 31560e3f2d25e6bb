//! Rational function interpolation.
//!
//! Diagonal rational interpolation (Bulirsch–Stoer) through a window of the
//! knots nearest to the evaluation point. Rational interpolants follow
//! resonant responses better than polynomials, at the price of possible poles.

use num_complex::Complex64 as C64;

use crate::error::{Error, Result};

/// Guards the `0/0` case when an interpolant passes through zero.
const TINY: f64 = 1.0e-25;

/// Interpolate at `at` using `order + 1` consecutive knots around it.
///
/// `x` must be sorted ascending. Evaluating exactly at a knot returns the
/// knot value. Outside the knot range the boundary window is used.
pub fn rfi(x: &[f64], y: &[C64], order: usize, at: f64) -> Result<C64> {
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
        if !(x[i] > x[i - 1]) {
            return Err(Error::InvalidKnots { index: i });
        }
    }

    let width = (order + 1).min(x.len());
    let pos = x.partition_point(|&knot| knot < at);
    let start = pos.saturating_sub(width / 2).min(x.len() - width);
    ratint(&x[start..start + width], &y[start..start + width], at)
}

/// Neville-style tableau of diagonal rational interpolants.
fn ratint(xa: &[f64], ya: &[C64], x: f64) -> Result<C64> {
    let n = xa.len();
    let mut c = ya.to_vec();
    let mut d: Vec<C64> = ya.iter().map(|v| v + TINY).collect();

    let mut ns = 0usize;
    let mut hh = (x - xa[0]).abs();
    for (i, &xi) in xa.iter().enumerate() {
        let h = (x - xi).abs();
        if h == 0.0 {
            return Ok(ya[i]);
        }
        if h < hh {
            ns = i;
            hh = h;
        }
    }

    let mut y = ya[ns];
    // Index of the tableau entry last used to correct y; -1 once exhausted.
    let mut cursor = ns as isize - 1;
    for m in 1..n {
        for i in 0..n - m {
            let w = c[i + 1] - d[i];
            let h = xa[i + m] - x;
            let t = d[i] * ((xa[i] - x) / h);
            let dd = t - c[i + 1];
            if dd.norm() == 0.0 {
                return Err(Error::Pole { x });
            }
            let dd = w / dd;
            d[i] = c[i + 1] * dd;
            c[i] = t * dd;
        }
        let dy = if 2 * (cursor + 1) < (n - m) as isize {
            c[(cursor + 1) as usize]
        } else {
            let v = d[cursor as usize];
            cursor -= 1;
            v
        };
        y += dy;
    }
    Ok(y)
}
