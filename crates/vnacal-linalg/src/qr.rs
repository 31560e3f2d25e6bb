//! Householder QR decomposition and QR-based solvers.
//!
//! [`qrd`] produces the compact form: on return the packed matrix holds the
//! unit-norm Householder vectors on and below the diagonal, the off-diagonal
//! part of `R` strictly above it, and the diagonal of `R` is kept separately.
//! Each vector's leading element sits on the diagonal, so [`Qrd::packed`]
//! is not the layout with vectors confined to the strict lower triangle;
//! read the diagonal of `R` from [`Qrd::diagonal`] only.
//! It works for square, tall and wide matrices.
//!
//! The solvers handle rectangular systems:
//! - overdetermined (`m > n`): least-squares minimizer of `‖A·X − B‖`
//! - underdetermined (`m < n`): a solution of `A·X = B` with every unknown
//!   past the rank set to exactly zero

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};

/// Compact Householder factorization of an `m × n` matrix.
#[derive(Debug, Clone)]
pub struct Qrd {
    packed: DMatrix<C64>,
    diagonal: Vec<C64>,
}

/// Factor `a` by Householder reflections, consuming it.
#[allow(clippy::needless_range_loop)]
pub fn qrd(a: DMatrix<C64>) -> Qrd {
    let (m, n) = a.shape();
    let p = m.min(n);
    let mut a = a;
    let mut diagonal = vec![C64::new(0.0, 0.0); p];

    for k in 0..p {
        let x0 = a[(k, k)];
        let tail: f64 = (k + 1..m).map(|i| a[(i, k)].norm_sqr()).sum();
        if tail == 0.0 {
            // Column already reduced: identity reflector.
            diagonal[k] = x0;
            a[(k, k)] = C64::new(0.0, 0.0);
            continue;
        }

        let norm_x = (x0.norm_sqr() + tail).sqrt();
        let phase = if x0.norm() == 0.0 {
            C64::new(1.0, 0.0)
        } else {
            x0 / x0.norm()
        };
        let alpha = -phase * norm_x;

        // v = x - alpha·e1, normalized
        a[(k, k)] = x0 - alpha;
        let v_norm = (a[(k, k)].norm_sqr() + tail).sqrt();
        for i in k..m {
            a[(i, k)] /= v_norm;
        }
        diagonal[k] = alpha;

        // Apply H = I - 2·v·vᴴ to the remaining columns.
        for j in k + 1..n {
            let mut s = C64::new(0.0, 0.0);
            for i in k..m {
                s += a[(i, k)].conj() * a[(i, j)];
            }
            let s2 = s * 2.0;
            for i in k..m {
                let vi = a[(i, k)];
                a[(i, j)] -= vi * s2;
            }
        }
    }

    Qrd {
        packed: a,
        diagonal,
    }
}

impl Qrd {
    /// Number of rows of the factored matrix.
    pub fn nrows(&self) -> usize {
        self.packed.nrows()
    }

    /// Number of columns of the factored matrix.
    pub fn ncols(&self) -> usize {
        self.packed.ncols()
    }

    /// Diagonal of `R`.
    pub fn diagonal(&self) -> &[C64] {
        &self.diagonal
    }

    /// Householder vectors (on and below the diagonal) and strict upper `R`.
    pub fn packed(&self) -> &DMatrix<C64> {
        &self.packed
    }

    /// Numeric rank: the number of non-negligible diagonal entries of `R`.
    pub fn rank(&self) -> usize {
        numeric_rank(&self.diagonal, self.nrows().max(self.ncols()))
    }

    /// Overwrite `b` with `Qᴴ·b`.
    fn apply_qh(&self, b: &mut DMatrix<C64>) {
        let m = self.nrows();
        for k in 0..self.diagonal.len() {
            self.reflect(k, b, m);
        }
    }

    /// Apply reflector `k` to every column of `b`.
    fn reflect(&self, k: usize, b: &mut DMatrix<C64>, m: usize) {
        for j in 0..b.ncols() {
            let mut s = C64::new(0.0, 0.0);
            for i in k..m {
                s += self.packed[(i, k)].conj() * b[(i, j)];
            }
            if s == C64::new(0.0, 0.0) {
                continue;
            }
            let s2 = s * 2.0;
            for i in k..m {
                b[(i, j)] -= self.packed[(i, k)] * s2;
            }
        }
    }

    /// Explicit `m × m` unitary factor.
    pub fn q(&self) -> DMatrix<C64> {
        let m = self.nrows();
        let mut q = DMatrix::identity(m, m);
        for k in (0..self.diagonal.len()).rev() {
            self.reflect(k, &mut q, m);
        }
        q
    }

    /// Explicit `m × n` upper-triangular factor.
    pub fn r(&self) -> DMatrix<C64> {
        let (m, n) = self.packed.shape();
        DMatrix::from_fn(m, n, |i, j| match i.cmp(&j) {
            std::cmp::Ordering::Less => self.packed[(i, j)],
            std::cmp::Ordering::Equal => self.diagonal[i],
            std::cmp::Ordering::Greater => C64::new(0.0, 0.0),
        })
    }

    /// Solve `A·X = B` from the compact factorization, consuming `B`.
    pub fn solve(&self, b: DMatrix<C64>) -> Result<DMatrix<C64>> {
        let (m, n) = self.packed.shape();
        if b.nrows() != m {
            return Err(Error::DimensionMismatch {
                expected: m,
                actual: b.nrows(),
            });
        }
        let mut c = b;
        self.apply_qh(&mut c);
        let packed = &self.packed;
        Ok(back_substitute(
            |i, j| packed[(i, j)],
            &self.diagonal,
            &c,
            n,
            m.max(n),
        ))
    }
}

/// Count diagonal entries above the relative rank tolerance.
fn numeric_rank(diagonal: &[C64], dim: usize) -> usize {
    let tol = rank_tolerance(diagonal, dim);
    diagonal.iter().filter(|d| d.norm() > tol).count()
}

fn rank_tolerance(diagonal: &[C64], dim: usize) -> f64 {
    let dmax = diagonal.iter().map(|d| d.norm()).fold(0.0, f64::max);
    dmax * dim as f64 * f64::EPSILON
}

/// Solve the leading triangular block of `R·X = C`.
///
/// Unknowns whose diagonal is negligible, and unknowns past the diagonal
/// length, are set to zero.
fn back_substitute(
    upper: impl Fn(usize, usize) -> C64,
    diagonal: &[C64],
    c: &DMatrix<C64>,
    n: usize,
    dim: usize,
) -> DMatrix<C64> {
    let p = diagonal.len();
    let tol = rank_tolerance(diagonal, dim);
    let mut x = DMatrix::from_element(n, c.ncols(), C64::new(0.0, 0.0));
    for col in 0..c.ncols() {
        for i in (0..p).rev() {
            if diagonal[i].norm() <= tol {
                log::trace!("qr back substitution: negligible pivot at {}", i);
                continue;
            }
            let mut sum = c[(i, col)];
            for j in i + 1..p {
                sum -= upper(i, j) * x[(j, col)];
            }
            x[(i, col)] = sum / diagonal[i];
        }
    }
    x
}

/// Explicit factorization `A = Q·R`, returning `(Q, R, rank)`.
pub fn qr(a: DMatrix<C64>) -> (DMatrix<C64>, DMatrix<C64>, usize) {
    let f = qrd(a);
    (f.q(), f.r(), f.rank())
}

/// Solve `A·X = B` for possibly rectangular `A`, consuming both inputs.
pub fn qrsolve(a: DMatrix<C64>, b: DMatrix<C64>) -> Result<DMatrix<C64>> {
    if a.nrows() != b.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    qrd(a).solve(b)
}

/// Solve `A·X = B` given an explicit factorization `A = Q·R`.
pub fn qrsolve2(q: &DMatrix<C64>, r: &DMatrix<C64>, b: &DMatrix<C64>) -> Result<DMatrix<C64>> {
    let (m, n) = r.shape();
    if q.nrows() != m || q.ncols() != m {
        return Err(Error::DimensionMismatch {
            expected: m,
            actual: q.ncols(),
        });
    }
    if b.nrows() != m {
        return Err(Error::DimensionMismatch {
            expected: m,
            actual: b.nrows(),
        });
    }
    let c = q.adjoint() * b;
    let diagonal: Vec<C64> = (0..m.min(n)).map(|i| r[(i, i)]).collect();
    Ok(back_substitute(|i, j| r[(i, j)], &diagonal, &c, n, m.max(n)))
}

/// Result of [`qrsolve_q`].
#[derive(Debug, Clone)]
pub struct QrSolution {
    /// Solution `X` (`n × o`).
    pub x: DMatrix<C64>,
    /// Explicit unitary factor (`m × m`).
    pub q: DMatrix<C64>,
    /// Numeric rank of `A`.
    pub rank: usize,
}

/// Like [`qrsolve`], additionally materializing `Q`.
pub fn qrsolve_q(a: DMatrix<C64>, b: DMatrix<C64>) -> Result<QrSolution> {
    if a.nrows() != b.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    let f = qrd(a);
    let x = f.solve(b)?;
    Ok(QrSolution {
        x,
        q: f.q(),
        rank: f.rank(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> C64 {
        C64::new(re, im)
    }

    fn fill(m: usize, n: usize, seed: f64) -> DMatrix<C64> {
        DMatrix::from_fn(m, n, |i, j| {
            let (r, k) = ((i + 1) as f64, (j + 1) as f64);
            c(
                (0.37 * r * k + 0.11 * r * r + seed).sin(),
                (0.53 * r * k * k + 0.29 * k + 0.7 * seed).cos(),
            )
        })
    }

    fn max_diff(x: &DMatrix<C64>, y: &DMatrix<C64>) -> f64 {
        x.iter()
            .zip(y.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_packed_vectors_start_on_diagonal() {
        let a = fill(5, 3, 0.4);
        let f = qrd(a);
        let packed = f.packed();
        for k in 0..3 {
            let norm: f64 = (k..5).map(|i| packed[(i, k)].norm_sqr()).sum();
            assert!((norm - 1.0).abs() < 1e-12, "column {}: |v|² = {}", k, norm);
            // The diagonal slot holds v's leading element, not R's diagonal.
            assert!((packed[(k, k)] - f.diagonal()[k]).norm() > 1e-6);
        }

        // A column with nothing below the diagonal gets an empty reflector.
        let upper = DMatrix::from_fn(3, 3, |i, j| {
            if i <= j { c(1.0 + j as f64, 0.5) } else { c(0.0, 0.0) }
        });
        let f = qrd(upper);
        assert_eq!(f.packed()[(2, 2)], c(0.0, 0.0));
        assert_eq!(f.diagonal()[2], c(3.0, 0.5));
    }

    #[test]
    fn test_qr_all_shapes() {
        for m in 1..=5 {
            for n in 1..=5 {
                let a = fill(m, n, (m * 10 + n) as f64);
                let (q, r, rank) = qr(a.clone());

                let qqh = &q * q.adjoint();
                assert!(
                    max_diff(&qqh, &DMatrix::identity(m, m)) < 1e-12,
                    "Q not unitary for {}x{}",
                    m,
                    n
                );
                for i in 0..m {
                    for j in 0..i.min(n) {
                        assert_eq!(r[(i, j)], c(0.0, 0.0));
                    }
                }
                assert!(max_diff(&(&q * &r), &a) < 1e-12, "QR != A for {}x{}", m, n);
                assert_eq!(rank, m.min(n));
            }
        }
    }

    #[test]
    fn test_rank_deficient() {
        // Second column is twice the first.
        let a = DMatrix::from_fn(3, 2, |i, j| c((i + 1) as f64 * (j + 1) as f64, 0.0));
        let (_, _, rank) = qr(a);
        assert_eq!(rank, 1);
    }

    #[test]
    fn test_square_solve() {
        let a = fill(4, 4, 2.0);
        let b = fill(4, 2, 9.0);
        let x = qrsolve(a.clone(), b.clone()).unwrap();
        assert!(max_diff(&(a * x), &b) < 1e-10);
    }

    #[test]
    fn test_qrsolve2_matches_qrsolve() {
        let a = fill(5, 3, 1.5);
        let b = fill(5, 2, 4.5);
        let (q, r, _) = qr(a.clone());
        let x1 = qrsolve(a, b.clone()).unwrap();
        let x2 = qrsolve2(&q, &r, &b).unwrap();
        assert!(max_diff(&x1, &x2) < 1e-12);
    }

    #[test]
    fn test_qrsolve_q_reports_rank() {
        let a = fill(2, 4, 0.0);
        let b = fill(2, 1, 3.0);
        let sol = qrsolve_q(a.clone(), b.clone()).unwrap();
        assert_eq!(sol.rank, 2);
        assert_eq!(sol.q.shape(), (2, 2));
        assert!(max_diff(&(a * &sol.x), &b) < 1e-10);
        assert_eq!(sol.x[(2, 0)], c(0.0, 0.0));
        assert_eq!(sol.x[(3, 0)], c(0.0, 0.0));
    }

    #[test]
    fn test_zero_column() {
        let mut a = fill(3, 3, 0.0);
        for i in 0..3 {
            a[(i, 1)] = c(0.0, 0.0);
        }
        let f = qrd(a.clone());
        assert_eq!(f.rank(), 2);
        assert!(max_diff(&(f.q() * f.r()), &a) < 1e-12);
    }
}
