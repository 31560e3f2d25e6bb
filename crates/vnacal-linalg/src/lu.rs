//! LU decomposition with partial pivoting.
//!
//! The factorization is `P·A = L·U` where `L` is unit lower triangular and `U`
//! upper triangular. Both factors share one matrix: `L` strictly below the
//! diagonal, `U` on and above it. The row permutation is kept as an index
//! vector where `perm[i]` is the row of the original matrix that ended up at
//! row `i`.

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};

/// Pivots at or below this fraction of the largest entry (times the
/// dimension) mark the matrix singular.
pub const SINGULAR_TOLERANCE: f64 = 1.0e-13;

/// Factor `a` in place and return its determinant.
///
/// On return `a` holds the combined `L\U` factors and `perm` the row
/// permutation. A zero pivot leaves the remaining columns unreduced; the
/// returned determinant is then exactly zero.
///
/// # Panics
///
/// Panics if `a` is not square or `perm.len()` differs from its dimension.
#[allow(clippy::needless_range_loop)]
pub fn lu(a: &mut DMatrix<C64>, perm: &mut [usize]) -> C64 {
    let n = a.nrows();
    assert_eq!(a.ncols(), n, "LU requires a square matrix");
    assert_eq!(perm.len(), n, "permutation length mismatch");

    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }
    let mut det = C64::new(1.0, 0.0);

    for k in 0..n {
        // Partial pivot: largest magnitude in column k at or below the diagonal.
        let mut pivot = k;
        let mut pivot_abs = a[(k, k)].norm();
        for i in k + 1..n {
            let v = a[(i, k)].norm();
            if v > pivot_abs {
                pivot = i;
                pivot_abs = v;
            }
        }
        if pivot != k {
            a.swap_rows(k, pivot);
            perm.swap(k, pivot);
            det = -det;
        }

        let d = a[(k, k)];
        det *= d;
        if d == C64::new(0.0, 0.0) {
            continue;
        }
        for i in k + 1..n {
            let factor = a[(i, k)] / d;
            a[(i, k)] = factor;
            if factor == C64::new(0.0, 0.0) {
                continue;
            }
            for j in k + 1..n {
                let ukj = a[(k, j)];
                a[(i, j)] -= factor * ukj;
            }
        }
    }
    det
}

/// Owned LU factorization of a square complex matrix.
#[derive(Debug, Clone)]
pub struct Lu {
    factors: DMatrix<C64>,
    perm: Vec<usize>,
    determinant: C64,
    /// Largest entry magnitude of the factored matrix.
    scale: f64,
}

impl Lu {
    /// Factor `a`, consuming it.
    pub fn new(a: DMatrix<C64>) -> Result<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: a.ncols(),
            });
        }
        let scale = a.iter().map(|z| z.norm()).fold(0.0, f64::max);
        let mut factors = a;
        let mut perm = vec![0; n];
        let determinant = lu(&mut factors, &mut perm);
        Ok(Self {
            factors,
            perm,
            determinant,
            scale,
        })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.perm.len()
    }

    /// Determinant of the original matrix.
    pub fn determinant(&self) -> C64 {
        self.determinant
    }

    /// Row permutation: `perm[i]` is the original row now at row `i`.
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// Combined `L\U` storage.
    pub fn factors(&self) -> &DMatrix<C64> {
        &self.factors
    }

    /// Unit lower-triangular factor.
    pub fn l(&self) -> DMatrix<C64> {
        let n = self.dim();
        DMatrix::from_fn(n, n, |i, j| match i.cmp(&j) {
            std::cmp::Ordering::Greater => self.factors[(i, j)],
            std::cmp::Ordering::Equal => C64::new(1.0, 0.0),
            std::cmp::Ordering::Less => C64::new(0.0, 0.0),
        })
    }

    /// Upper-triangular factor.
    pub fn u(&self) -> DMatrix<C64> {
        let n = self.dim();
        DMatrix::from_fn(n, n, |i, j| {
            if i <= j {
                self.factors[(i, j)]
            } else {
                C64::new(0.0, 0.0)
            }
        })
    }

    /// True if some pivot is negligible relative to the matrix entries.
    pub fn is_singular(&self) -> bool {
        let n = self.dim();
        if n == 0 {
            return false;
        }
        if self.scale == 0.0 {
            return true;
        }
        let tol = SINGULAR_TOLERANCE * n as f64 * self.scale;
        (0..n).any(|k| self.factors[(k, k)].norm() <= tol)
    }

    /// Solve `A·X = B`.
    pub fn solve(&self, b: &DMatrix<C64>) -> Result<DMatrix<C64>> {
        let n = self.dim();
        if b.nrows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: b.nrows(),
            });
        }
        if self.is_singular() {
            return Err(Error::SingularMatrix);
        }

        let lu = &self.factors;
        let mut x = DMatrix::from_element(n, b.ncols(), C64::new(0.0, 0.0));
        for c in 0..b.ncols() {
            // Forward substitution with the permuted right-hand side.
            for i in 0..n {
                let mut sum = b[(self.perm[i], c)];
                for k in 0..i {
                    sum -= lu[(i, k)] * x[(k, c)];
                }
                x[(i, c)] = sum;
            }
            // Back substitution.
            for i in (0..n).rev() {
                let mut sum = x[(i, c)];
                for k in i + 1..n {
                    sum -= lu[(i, k)] * x[(k, c)];
                }
                x[(i, c)] = sum / lu[(i, i)];
            }
        }
        Ok(x)
    }

    /// Solve `X·A = B`.
    ///
    /// With `A = Pᵀ·L·U`, each row of `B` is first solved against `U`, then
    /// against `L`, and finally its columns are scattered back through the
    /// permutation.
    pub fn solve_right(&self, b: &DMatrix<C64>) -> Result<DMatrix<C64>> {
        let n = self.dim();
        if b.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: b.ncols(),
            });
        }
        if self.is_singular() {
            return Err(Error::SingularMatrix);
        }

        let lu = &self.factors;
        let mut x = DMatrix::from_element(b.nrows(), n, C64::new(0.0, 0.0));
        let mut y = vec![C64::new(0.0, 0.0); n];
        for r in 0..b.nrows() {
            // y·U = b
            for j in 0..n {
                let mut sum = b[(r, j)];
                for k in 0..j {
                    sum -= y[k] * lu[(k, j)];
                }
                y[j] = sum / lu[(j, j)];
            }
            // z·L = y, computed in place in y
            for j in (0..n).rev() {
                let mut sum = y[j];
                for k in j + 1..n {
                    sum -= y[k] * lu[(k, j)];
                }
                y[j] = sum;
            }
            for j in 0..n {
                x[(r, self.perm[j])] = y[j];
            }
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> C64 {
        C64::new(re, im)
    }

    fn test_matrix(n: usize) -> DMatrix<C64> {
        DMatrix::from_fn(n, n, |i, j| {
            let (r, k) = ((i + 1) as f64, (j + 1) as f64);
            c((0.37 * r * k + 0.11 * r * r).sin(), (0.53 * r * k * k + 0.29 * k).cos())
        })
    }

    #[test]
    fn test_reconstruct_plu() {
        for n in 1..=5 {
            let a = test_matrix(n);
            let f = Lu::new(a.clone()).unwrap();
            let prod = f.l() * f.u();
            for i in 0..n {
                for j in 0..n {
                    let orig = a[(f.permutation()[i], j)];
                    assert!(
                        (prod[(i, j)] - orig).norm() < 1e-12,
                        "n={} ({},{}): {} vs {}",
                        n,
                        i,
                        j,
                        prod[(i, j)],
                        orig
                    );
                }
            }
        }
    }

    #[test]
    fn test_determinant_2x2() {
        let a = DMatrix::from_row_slice(
            2,
            2,
            &[c(1.0, 1.0), c(2.0, 0.0), c(3.0, 0.0), c(4.0, -1.0)],
        );
        // (1+i)(4-i) - 6 = 5 + 3i - 6 = -1 + 3i
        let f = Lu::new(a).unwrap();
        assert!((f.determinant() - c(-1.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_singular_detected() {
        let a = DMatrix::from_row_slice(
            2,
            2,
            &[c(1.0, 0.0), c(2.0, 0.0), c(2.0, 0.0), c(4.0, 0.0)],
        );
        let f = Lu::new(a).unwrap();
        assert!(f.determinant().norm() < 1e-12);
        assert!(f.is_singular());
        let b = DMatrix::from_element(2, 1, c(1.0, 0.0));
        assert!(matches!(f.solve(&b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_non_square_rejected() {
        let a = DMatrix::from_element(2, 3, c(1.0, 0.0));
        assert!(matches!(Lu::new(a), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_empty_matrix() {
        let f = Lu::new(DMatrix::from_element(0, 0, c(0.0, 0.0))).unwrap();
        assert_eq!(f.determinant(), c(1.0, 0.0));
        assert!(!f.is_singular());
    }
}
