//! Dense linear algebra kernel.
//!
//! Thin, checked wrappers around nalgebra: shape validation, conditioning
//! classification before inversion, balanced eigenvalue computation and the
//! matrix exponential. Everything above this module works in terms of these
//! helpers so that failures surface as [`LtiError`] values instead of panics
//! or silent `NaN`s.

use crate::error::{LtiError, LtiResult};
use nalgebra::linalg::Schur;
use nalgebra::{Complex, DMatrix, DVector};
use std::cmp::Ordering;

/// Iteration cap for the Schur decomposition.
pub const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Ratio σ_max/σ_min above which an inversion is refused.
pub const CONDITION_LIMIT: f64 = 1e12;

/// Maximum balancing sweeps.
const BALANCE_MAX_SWEEPS: usize = 100;

/// Build a matrix from row vectors, rejecting ragged or non-finite input.
pub fn matrix_from_rows(rows: &[Vec<f64>], what: &str) -> LtiResult<DMatrix<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(LtiError::dims(format!("{what}: rows have differing lengths")));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    ensure_finite_slice(&flat, what)?;
    Ok(DMatrix::from_row_slice(nrows, ncols, &flat))
}

pub(crate) fn ensure_finite_slice(values: &[f64], what: &str) -> LtiResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LtiError::param(format!("{what} contains non-finite entries")))
    }
}

pub(crate) fn ensure_finite_matrix(m: &DMatrix<f64>, what: &str) -> LtiResult<()> {
    ensure_finite_slice(m.as_slice(), what)
}

/// Checked product `a * b`.
pub fn multiply(a: &DMatrix<f64>, b: &DMatrix<f64>) -> LtiResult<DMatrix<f64>> {
    if a.ncols() != b.nrows() {
        return Err(LtiError::dims(format!(
            "cannot multiply {}x{} by {}x{}",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    Ok(a * b)
}

/// Maximum absolute row sum.
pub fn inf_norm(a: &DMatrix<f64>) -> f64 {
    a.row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

fn ensure_square(a: &DMatrix<f64>, what: &str) -> LtiResult<usize> {
    if a.is_square() {
        Ok(a.nrows())
    } else {
        Err(LtiError::dims(format!(
            "{what} must be square, got {}x{}",
            a.nrows(),
            a.ncols()
        )))
    }
}

/// Extreme singular values `(σ_max, σ_min)` of a non-empty matrix.
fn singular_value_range(a: &DMatrix<f64>) -> (f64, f64) {
    let svd = a.clone().svd(false, false);
    svd.singular_values
        .iter()
        .fold((0.0_f64, f64::INFINITY), |(hi, lo), &s| (hi.max(s), lo.min(s)))
}

/// 2-norm condition number; `f64::INFINITY` for a rank-deficient matrix.
pub fn condition_number(a: &DMatrix<f64>) -> f64 {
    if a.is_empty() {
        return 1.0;
    }
    let (hi, lo) = singular_value_range(a);
    if lo == 0.0 { f64::INFINITY } else { hi / lo }
}

/// Refuse singular or badly conditioned square matrices.
fn check_invertible(a: &DMatrix<f64>, what: &str) -> LtiResult<()> {
    let n = ensure_square(a, what)?;
    if n == 0 {
        return Ok(());
    }
    let cond = condition_number(a);
    if cond * n as f64 * f64::EPSILON >= 1.0 {
        return Err(LtiError::SingularSystem {
            what: format!("{what} is singular (condition number {cond:.3e})"),
        });
    }
    if cond > CONDITION_LIMIT {
        return Err(LtiError::NumericalInstability {
            what: format!("{what} is ill-conditioned (condition number {cond:.3e})"),
        });
    }
    Ok(())
}

/// Inverse of a well-conditioned square matrix.
pub fn inverse(a: &DMatrix<f64>, what: &str) -> LtiResult<DMatrix<f64>> {
    check_invertible(a, what)?;
    a.clone()
        .try_inverse()
        .ok_or_else(|| LtiError::SingularSystem {
            what: format!("{what} could not be inverted"),
        })
}

/// Solve `a * x = b` for a well-conditioned square `a`.
pub fn solve(a: &DMatrix<f64>, b: &DMatrix<f64>, what: &str) -> LtiResult<DMatrix<f64>> {
    check_invertible(a, what)?;
    if b.nrows() != a.nrows() {
        return Err(LtiError::dims(format!(
            "{what}: right-hand side has {} rows, expected {}",
            b.nrows(),
            a.nrows()
        )));
    }
    a.clone()
        .lu()
        .solve(b)
        .ok_or_else(|| LtiError::SingularSystem {
            what: format!("{what}: LU solve failed"),
        })
}

/// Diagonal similarity scaling (Parlett–Reinsch) that equalises row and
/// column norms. Eigenvalues are unchanged; their computed accuracy improves
/// for badly scaled matrices such as companion matrices.
pub fn balance(a: &DMatrix<f64>) -> DMatrix<f64> {
    const RADIX: f64 = 2.0;
    let sqr_radix = RADIX * RADIX;
    let n = a.nrows();
    let mut m = a.clone();

    for _ in 0..BALANCE_MAX_SWEEPS {
        let mut done = true;
        for i in 0..n {
            let mut c = 0.0;
            let mut r = 0.0;
            for j in 0..n {
                if j != i {
                    c += m[(j, i)].abs();
                    r += m[(i, j)].abs();
                }
            }
            if c == 0.0 || r == 0.0 {
                continue;
            }
            let s = c + r;
            let mut f = 1.0;
            let mut g = r / RADIX;
            while c < g {
                f *= RADIX;
                c *= sqr_radix;
            }
            g = r * RADIX;
            while c > g {
                f /= RADIX;
                c /= sqr_radix;
            }
            if (c + r) / f < 0.95 * s {
                done = false;
                let inv = 1.0 / f;
                for j in 0..n {
                    m[(i, j)] *= inv;
                    m[(j, i)] *= f;
                }
            }
        }
        if done {
            break;
        }
    }
    m
}

/// Deterministic ordering: real part, then imaginary part.
pub fn cmp_complex(a: &Complex<f64>, b: &Complex<f64>) -> Ordering {
    a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im))
}

/// Eigenvalues of a square matrix, sorted by [`cmp_complex`].
pub fn eigenvalues(a: &DMatrix<f64>) -> LtiResult<Vec<Complex<f64>>> {
    let n = ensure_square(a, "eigenvalue input")?;
    ensure_finite_matrix(a, "eigenvalue input")?;
    if n == 0 {
        return Ok(Vec::new());
    }
    if n == 1 {
        return Ok(vec![Complex::new(a[(0, 0)], 0.0)]);
    }

    let schur = Schur::try_new(balance(a), f64::EPSILON, EIGEN_MAX_ITERATIONS).ok_or_else(
        || LtiError::NumericalInstability {
            what: format!("Schur iteration did not converge for a {n}x{n} matrix"),
        },
    )?;
    let mut values: Vec<Complex<f64>> = schur.complex_eigenvalues().iter().copied().collect();
    if values.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
        return Err(LtiError::NumericalInstability {
            what: "eigenvalue computation produced non-finite values".to_string(),
        });
    }
    values.sort_by(cmp_complex);
    Ok(values)
}

/// Matrix exponential `e^a`.
pub fn expm(a: &DMatrix<f64>) -> LtiResult<DMatrix<f64>> {
    ensure_square(a, "matrix exponential input")?;
    ensure_finite_matrix(a, "matrix exponential input")?;
    if a.is_empty() {
        return Ok(a.clone());
    }
    let e = a.exp();
    if e.iter().all(|v| v.is_finite()) {
        Ok(e)
    } else {
        Err(LtiError::NumericalInstability {
            what: "matrix exponential overflowed".to_string(),
        })
    }
}

/// Orthonormal basis of the block Krylov subspace span{S, A·S, A²·S, ...}.
///
/// Block Arnoldi iteration with one reorthogonalisation pass. A candidate is
/// accepted while its component orthogonal to the current basis exceeds
/// `rel_tol` times the candidate's own norm.
pub fn krylov_basis(a: &DMatrix<f64>, starts: &DMatrix<f64>, rel_tol: f64) -> DMatrix<f64> {
    let n = a.nrows();
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(n);
    let mut frontier: Vec<DVector<f64>> = starts.column_iter().map(|c| c.into_owned()).collect();

    while !frontier.is_empty() && basis.len() < n {
        let mut added = Vec::new();
        for mut w in frontier {
            if basis.len() == n {
                break;
            }
            let w_norm = w.norm();
            if w_norm == 0.0 {
                continue;
            }
            for _ in 0..2 {
                for q in &basis {
                    let proj = q.dot(&w);
                    w -= q * proj;
                }
            }
            let residual = w.norm();
            if residual > rel_tol * w_norm {
                let q = w / residual;
                basis.push(q.clone());
                added.push(q);
            }
        }
        frontier = added.iter().map(|q| a * q).collect();
    }

    if basis.is_empty() {
        DMatrix::zeros(n, 0)
    } else {
        DMatrix::from_columns(&basis)
    }
}
