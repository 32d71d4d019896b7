//! Linear algebra utilities.
//!
//! Jacobi SVD, numerical rank, Gauss-Jordan inversion, least squares.
//! Sized for the small dense systems in this project (up to 16×16).

use balance_types::error::{BalanceError, BalanceResult};
use ndarray::{s, Array1, Array2, Axis};

/// Sweep limit for one-sided Jacobi. Converges in < 10 for 4×4.
const JACOBI_MAX_SWEEPS: usize = 60;

/// Singular values of `a`, descending.
///
/// One-sided (Hestenes) Jacobi on the columns, so small singular values
/// keep full relative accuracy instead of being squared away through AᵀA.
pub fn singular_values(a: &Array2<f64>) -> Array1<f64> {
    let (m, n) = a.dim();
    // Orthogonalize the columns of the taller orientation.
    let mut u = if m >= n { a.clone() } else { a.t().to_owned() };
    let cols = u.ncols();

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut rotated = false;
        for i in 0..cols {
            for j in (i + 1)..cols {
                let alpha: f64 = u.column(i).iter().map(|v| v * v).sum();
                let beta: f64 = u.column(j).iter().map(|v| v * v).sum();
                let gamma: f64 = u.column(i).dot(&u.column(j));
                if gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() || gamma == 0.0 {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let cos = 1.0 / (1.0 + t * t).sqrt();
                let sin = cos * t;
                for r in 0..u.nrows() {
                    let ui = u[[r, i]];
                    let uj = u[[r, j]];
                    u[[r, i]] = cos * ui - sin * uj;
                    u[[r, j]] = sin * ui + cos * uj;
                }
            }
        }
        if !rotated {
            break;
        }
    }

    let mut sigma: Vec<f64> = u
        .axis_iter(Axis(1))
        .map(|c| c.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect();
    sigma.sort_by(|x, y| y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal));
    Array1::from_vec(sigma)
}

/// Numerical rank: number of singular values above `tol`.
///
/// Default tolerance is `max(m, n) · ε · σ_max`.
pub fn matrix_rank(a: &Array2<f64>, tol: Option<f64>) -> usize {
    let sigma = singular_values(a);
    let sigma_max = sigma.first().copied().unwrap_or(0.0);
    let (m, n) = a.dim();
    let tol = tol.unwrap_or(m.max(n) as f64 * f64::EPSILON * sigma_max);
    sigma.iter().filter(|&&s| s > tol).count()
}

/// Inverse and determinant via Gauss-Jordan with partial pivoting.
pub fn invert_with_det(a: &Array2<f64>) -> BalanceResult<(Array2<f64>, f64)> {
    let (m, n) = a.dim();
    if m != n {
        return Err(BalanceError::LinAlg(format!(
            "cannot invert non-square {m}x{n} matrix"
        )));
    }
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() {
        return Err(BalanceError::LinAlg("matrix has non-finite entries".into()));
    }
    let mut work = a.clone();
    let mut inv = Array2::<f64>::eye(n);
    let mut det = 1.0;

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                work[[i, col]]
                    .abs()
                    .partial_cmp(&work[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        let pivot = work[[pivot_row, col]];
        if pivot.abs() <= f64::EPSILON * scale || pivot == 0.0 {
            return Err(BalanceError::LinAlg(format!(
                "singular matrix (pivot {pivot:e} in column {col})"
            )));
        }
        if pivot_row != col {
            swap_rows(&mut work, pivot_row, col);
            swap_rows(&mut inv, pivot_row, col);
            det = -det;
        }
        det *= pivot;

        let inv_pivot = 1.0 / pivot;
        work.row_mut(col).mapv_inplace(|v| v * inv_pivot);
        inv.row_mut(col).mapv_inplace(|v| v * inv_pivot);

        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = work[[r, col]];
            if factor == 0.0 {
                continue;
            }
            let pivot_work = work.row(col).to_owned();
            let pivot_inv = inv.row(col).to_owned();
            work.row_mut(r).scaled_add(-factor, &pivot_work);
            inv.row_mut(r).scaled_add(-factor, &pivot_inv);
        }
    }

    Ok((inv, det))
}

pub fn invert(a: &Array2<f64>) -> BalanceResult<Array2<f64>> {
    invert_with_det(a).map(|(inv, _)| inv)
}

fn swap_rows(m: &mut Array2<f64>, i: usize, j: usize) {
    let ri = m.row(i).to_owned();
    let rj = m.row(j).to_owned();
    m.row_mut(i).assign(&rj);
    m.row_mut(j).assign(&ri);
}

/// Least-squares solution of `M·X = RHS` through the normal equations.
///
/// Adequate for the well-conditioned 8×4 systems of the sign-function
/// Riccati solver; not a general-purpose solver.
pub fn lstsq(m: &Array2<f64>, rhs: &Array2<f64>) -> BalanceResult<Array2<f64>> {
    if m.nrows() != rhs.nrows() {
        return Err(BalanceError::LinAlg(format!(
            "lstsq row mismatch: {} vs {}",
            m.nrows(),
            rhs.nrows()
        )));
    }
    let mtm = m.t().dot(m);
    let mtb = m.t().dot(rhs);
    Ok(invert(&mtm)?.dot(&mtb))
}

/// Induced 1-norm (max absolute column sum).
pub fn norm_l1(a: &Array2<f64>) -> f64 {
    a.axis_iter(Axis(1))
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Cholesky test for symmetric positive definiteness.
pub fn is_positive_definite(a: &Array2<f64>) -> bool {
    let (m, n) = a.dim();
    if m != n {
        return false;
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            if (a[[i, j]] - a[[j, i]]).abs() > 1e-12 * (1.0 + a[[i, j]].abs()) {
                return false;
            }
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let d = a[[i, i]] - sum;
                if !(d > 0.0) {
                    return false;
                }
                l[[i, j]] = d.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    true
}

/// Stacks `top` over `bottom`.
pub fn vstack(top: &Array2<f64>, bottom: &Array2<f64>) -> BalanceResult<Array2<f64>> {
    if top.ncols() != bottom.ncols() {
        return Err(BalanceError::LinAlg(format!(
            "vstack column mismatch: {} vs {}",
            top.ncols(),
            bottom.ncols()
        )));
    }
    let mut out = Array2::zeros((top.nrows() + bottom.nrows(), top.ncols()));
    out.slice_mut(s![..top.nrows(), ..]).assign(top);
    out.slice_mut(s![top.nrows().., ..]).assign(bottom);
    Ok(out)
}
