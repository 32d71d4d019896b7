// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Riccati
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Continuous-time algebraic Riccati equation.
//!
//! Solves `AᵀP + PA − P·B·R⁻¹·Bᵀ·P + Q = 0` for the stabilizing `P` via the
//! matrix sign function of the Hamiltonian
//!
//! ```text
//! H = [  A   −B·R⁻¹·Bᵀ ]
//!     [ −Q       −Aᵀ   ]
//! ```
//!
//! `sign(H)` is −1 on the stable invariant subspace `span[I; P]`, so `P`
//! follows from `[W₁₂; W₂₂ + I]·P = −[W₁₁ + I; W₂₁]`.

use crate::linalg::{invert, invert_with_det, lstsq, norm_l1, vstack};
use balance_types::error::{BalanceError, BalanceResult};
use ndarray::{s, Array2};

/// Sign iteration limit. Typically converges in under 10.
const MAX_SIGN_ITERATIONS: usize = 100;

/// Relative change in `Z` that counts as converged.
const SIGN_TOL: f64 = 1e-12;

/// Relative Riccati residual accepted on the recovered `P`.
const RESIDUAL_TOL: f64 = 1e-6;

/// Stabilizing Riccati solution with solver diagnostics.
#[derive(Debug, Clone)]
pub struct CareSolution {
    pub p: Array2<f64>,
    pub iterations: usize,
    /// ‖AᵀP + PA − PGP + Q‖₁ / max(1, ‖Q‖₁)
    pub residual: f64,
}

/// Solve the CARE for `(A, B, Q, R)`.
///
/// `A` n×n, `B` n×m, `Q` n×n, `R` m×m. Fails when the sign iteration
/// stalls, when `H` has eigenvalues on the imaginary axis (singular
/// iterate), or when the recovered `P` does not satisfy the equation.
pub fn solve_care(
    a: &Array2<f64>,
    b: &Array2<f64>,
    q: &Array2<f64>,
    r: &Array2<f64>,
) -> BalanceResult<CareSolution> {
    let n = a.nrows();
    let m = b.ncols();
    if a.dim() != (n, n) || b.nrows() != n || q.dim() != (n, n) || r.dim() != (m, m) {
        return Err(BalanceError::LinAlg(format!(
            "CARE dimension mismatch: A {:?}, B {:?}, Q {:?}, R {:?}",
            a.dim(),
            b.dim(),
            q.dim(),
            r.dim()
        )));
    }

    let r_inv = invert(r)?;
    let g = b.dot(&r_inv).dot(&b.t());

    let mut z = Array2::<f64>::zeros((2 * n, 2 * n));
    z.slice_mut(s![..n, ..n]).assign(a);
    z.slice_mut(s![..n, n..]).assign(&(-&g));
    z.slice_mut(s![n.., ..n]).assign(&(-q));
    z.slice_mut(s![n.., n..]).assign(&(-&a.t()));

    let mut iterations = 0;
    let mut converged = false;
    while iterations < MAX_SIGN_ITERATIONS {
        iterations += 1;
        let (z_inv, det) = invert_with_det(&z).map_err(|_| BalanceError::RiccatiDiverged {
            iterations,
            residual: f64::NAN,
        })?;
        // Determinant scaling speeds up the early, far-from-converged steps.
        let mut scale = det.abs().powf(-1.0 / (2 * n) as f64);
        if !scale.is_finite() || scale <= 0.0 {
            scale = 1.0;
        }
        let next = (&z * scale + &z_inv / scale) * 0.5;
        let delta = norm_l1(&(&next - &z));
        let size = norm_l1(&next);
        z = next;
        if !size.is_finite() {
            break;
        }
        if delta <= SIGN_TOL * size {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(BalanceError::RiccatiDiverged {
            iterations,
            residual: f64::NAN,
        });
    }

    let eye = Array2::<f64>::eye(n);
    let w11 = z.slice(s![..n, ..n]).to_owned();
    let w12 = z.slice(s![..n, n..]).to_owned();
    let w21 = z.slice(s![n.., ..n]).to_owned();
    let w22 = z.slice(s![n.., n..]).to_owned();

    let lhs = vstack(&w12, &(&w22 + &eye))?;
    let rhs = -vstack(&(&w11 + &eye), &w21)?;
    let p = lstsq(&lhs, &rhs)?;
    let p = (&p + &p.t()) * 0.5;

    let residual = care_residual(a, &g, q, &p);
    if !residual.is_finite() || residual > RESIDUAL_TOL {
        return Err(BalanceError::RiccatiDiverged {
            iterations,
            residual,
        });
    }

    Ok(CareSolution {
        p,
        iterations,
        residual,
    })
}

/// Relative residual of `AᵀP + PA − PGP + Q` with `G = B·R⁻¹·Bᵀ`.
pub fn care_residual(a: &Array2<f64>, g: &Array2<f64>, q: &Array2<f64>, p: &Array2<f64>) -> f64 {
    let res = a.t().dot(p) + p.dot(a) - p.dot(g).dot(p) + q;
    norm_l1(&res) / norm_l1(q).max(1.0)
}
