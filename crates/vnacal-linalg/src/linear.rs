//! Matrix division, inversion and multiplication.
//!
//! The divisions consume their coefficient matrix: it becomes the LU scratch
//! space. Each returns the determinant alongside the result so that callers
//! can apply their own conditioning checks.

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};
use crate::lu::Lu;

/// Solve `A·X = B` for `X`.
///
/// Returns `X` and the determinant of `A`.
pub fn mldivide(a: DMatrix<C64>, b: &DMatrix<C64>) -> Result<(DMatrix<C64>, C64)> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }

    let lu = Lu::new(a)?;
    let x = lu.solve(b)?;
    Ok((x, lu.determinant()))
}

/// Solve `X·A = B` for `X`.
///
/// Returns `X` and the determinant of `A`.
pub fn mrdivide(b: &DMatrix<C64>, a: DMatrix<C64>) -> Result<(DMatrix<C64>, C64)> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.ncols() != b.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.ncols(),
            actual: b.ncols(),
        });
    }

    let lu = Lu::new(a)?;
    let x = lu.solve_right(b)?;
    Ok((x, lu.determinant()))
}

/// Invert `A`.
///
/// Returns the inverse and the determinant of `A`.
pub fn minverse(a: DMatrix<C64>) -> Result<(DMatrix<C64>, C64)> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }

    let lu = Lu::new(a)?;
    let x = lu.solve(&DMatrix::identity(n, n))?;
    Ok((x, lu.determinant()))
}

/// Dense product `C = A·B`.
pub fn mmultiply(a: &DMatrix<C64>, b: &DMatrix<C64>) -> Result<DMatrix<C64>> {
    if a.ncols() != b.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.ncols(),
            actual: b.nrows(),
        });
    }

    let (m, n, o) = (a.nrows(), a.ncols(), b.ncols());
    let mut c = DMatrix::from_element(m, o, C64::new(0.0, 0.0));
    for i in 0..m {
        for k in 0..o {
            let mut sum = C64::new(0.0, 0.0);
            for j in 0..n {
                sum += a[(i, j)] * b[(j, k)];
            }
            c[(i, k)] = sum;
        }
    }
    Ok(c)
}
