//! Property checks for the matrix kernels over all small shapes.

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;
use vnacal_linalg::{Lu, minverse, mldivide, mrdivide, qr, qrsolve, spline_calc};

/// Deterministic, generically full-rank test matrix.
fn fill(m: usize, n: usize, seed: f64) -> DMatrix<C64> {
    DMatrix::from_fn(m, n, |i, j| {
        let (r, k) = ((i + 1) as f64, (j + 1) as f64);
        C64::new(
            (0.41 * r * k + 0.13 * r * r + seed).sin(),
            (0.57 * r * k * k + 0.23 * k - seed).cos(),
        )
    })
}

fn max_diff(x: &DMatrix<C64>, y: &DMatrix<C64>) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max)
}

/// Determinant by cofactor expansion along the first row.
fn cofactor_det(a: &DMatrix<C64>) -> C64 {
    let n = a.nrows();
    if n == 1 {
        return a[(0, 0)];
    }
    let mut det = C64::new(0.0, 0.0);
    for j in 0..n {
        let minor = a.clone().remove_row(0).remove_column(j);
        let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
        det += a[(0, j)] * cofactor_det(&minor) * sign;
    }
    det
}

fn residual_sq(a: &DMatrix<C64>, x: &DMatrix<C64>, b: &DMatrix<C64>) -> f64 {
    (a * x - b).iter().map(|z| z.norm_sqr()).sum()
}

#[test]
fn lu_reconstructs_and_matches_cofactor_determinant() {
    for n in 1..=5 {
        let a = fill(n, n, n as f64);
        let f = Lu::new(a.clone()).unwrap();

        let lu = f.l() * f.u();
        let permuted = DMatrix::from_fn(n, n, |i, j| a[(f.permutation()[i], j)]);
        assert!(max_diff(&lu, &permuted) < 1e-12, "n={}", n);

        let expected = cofactor_det(&a);
        assert!(
            (f.determinant() - expected).norm() < 1e-10 * expected.norm().max(1.0),
            "n={}: {} vs {}",
            n,
            f.determinant(),
            expected
        );
    }
}

#[test]
fn division_round_trips() {
    for n in 1..=5 {
        let mut a = fill(n, n, 0.3);
        for i in 0..n {
            a[(i, i)] += C64::new(2.0, 0.0);
        }
        let b_left = fill(n, 2, 1.7);
        let b_right = fill(3, n, 2.9);

        let (x, _) = mldivide(a.clone(), &b_left).unwrap();
        assert!(max_diff(&(&a * &x), &b_left) < 1e-10);

        let (x, _) = mrdivide(&b_right, a.clone()).unwrap();
        assert!(max_diff(&(&x * &a), &b_right) < 1e-10);

        let (inv, _) = minverse(a.clone()).unwrap();
        assert!(max_diff(&(&a * &inv), &DMatrix::identity(n, n)) < 1e-10);
    }
}

#[test]
fn constructed_singular_matrix_has_zero_determinant() {
    // Third row is the sum of the first two.
    let mut a = fill(3, 3, 0.0);
    for j in 0..3 {
        a[(2, j)] = a[(0, j)] + a[(1, j)];
    }
    let f = Lu::new(a).unwrap();
    assert!(f.determinant().norm() < 1e-12);
    assert!(f.is_singular());
}

#[test]
fn qr_properties_for_all_small_shapes() {
    for m in 1..=5 {
        for n in 1..=5 {
            let a = fill(m, n, 0.1 * (m + n) as f64);
            let (q, r, rank) = qr(a.clone());

            assert!(max_diff(&(&q * q.adjoint()), &DMatrix::identity(m, m)) < 1e-12);
            for i in 0..m {
                for j in 0..i.min(n) {
                    assert_eq!(r[(i, j)], C64::new(0.0, 0.0), "{}x{} R[{},{}]", m, n, i, j);
                }
            }
            assert!(max_diff(&(&q * &r), &a) < 1e-12);
            assert!(rank <= m.min(n));
        }
    }
}

#[test]
fn overdetermined_solution_is_least_squares_minimum() {
    for (m, n) in [(3, 1), (3, 2), (4, 3), (5, 2), (5, 4)] {
        let a = fill(m, n, 0.7);
        let b = fill(m, 1, 4.2);
        let x = qrsolve(a.clone(), b.clone()).unwrap();
        let best = residual_sq(&a, &x, &b);

        let deltas = [
            C64::new(0.001, 0.0),
            C64::new(-0.001, 0.0),
            C64::new(0.0, 0.001),
            C64::new(0.0, -0.001),
        ];
        for k in 0..n {
            for d in deltas {
                let mut xp = x.clone();
                xp[(k, 0)] += d;
                let r = residual_sq(&a, &xp, &b);
                assert!(
                    r >= best - 1e-12,
                    "{}x{} unknown {} delta {}: {} < {}",
                    m,
                    n,
                    k,
                    d,
                    r,
                    best
                );
            }
        }
    }
}

#[test]
fn underdetermined_solution_is_exact_with_zero_excess() {
    for (m, n) in [(1, 2), (1, 5), (2, 3), (3, 5), (4, 5)] {
        let a = fill(m, n, 1.9);
        let b = fill(m, 2, 3.1);
        let x = qrsolve(a.clone(), b.clone()).unwrap();
        assert!(max_diff(&(&a * &x), &b) < 1e-10, "{}x{}", m, n);
        for i in m..n {
            for j in 0..2 {
                assert_eq!(x[(i, j)], C64::new(0.0, 0.0));
            }
        }
    }
}

#[test]
fn spline_through_frequency_response() {
    let f: Vec<f64> = (0..11).map(|i| 1.0e9 + i as f64 * 0.5e9).collect();
    let y: Vec<C64> = f.iter().map(|&v| C64::from_polar(0.9, -v * 2.0e-10)).collect();
    let s = spline_calc(&f, &y).unwrap();
    for (fi, yi) in f.iter().zip(y.iter()) {
        assert!((s.eval(*fi) - yi).norm() < 1e-12);
    }
    // Between knots the spline stays close to the smooth underlying curve.
    let mid = 3.25e9;
    assert!((s.eval(mid) - C64::from_polar(0.9, -mid * 2.0e-10)).norm() < 1e-3);
}
