// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — LQR
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Infinite-horizon LQR gain synthesis.
//!
//! `K = R⁻¹·Bᵀ·P` with `P` the stabilizing CARE solution. The closed loop
//! `A − B·K` is verified Hurwitz before the gain is handed out.

use balance_math::linalg::{invert, is_positive_definite};
use balance_math::riccati::solve_care;
use balance_math::spectrum::{eigenvalues, is_hurwitz, spectral_abscissa};
use balance_types::error::{BalanceError, BalanceResult};
use balance_types::state::GainMatrix;
use ndarray::Array2;
use num_complex::Complex64;
use tracing::{debug, info};

/// Synthesized gain with the Riccati solution and closed-loop poles.
#[derive(Debug, Clone)]
pub struct LqrSolution {
    pub gain: GainMatrix,
    pub riccati: Array2<f64>,
    pub closed_loop_poles: Vec<Complex64>,
}

impl LqrSolution {
    /// Slowest closed-loop pole (largest real part).
    pub fn spectral_abscissa(&self) -> f64 {
        self.closed_loop_poles
            .iter()
            .map(|z| z.re)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

fn validate_weights(q: &Array2<f64>, r: &Array2<f64>, n: usize, m: usize) -> BalanceResult<()> {
    if q.dim() != (n, n) {
        return Err(BalanceError::ConfigError(format!(
            "Q must be {n}x{n}, got {:?}",
            q.dim()
        )));
    }
    if r.dim() != (m, m) {
        return Err(BalanceError::ConfigError(format!(
            "R must be {m}x{m}, got {:?}",
            r.dim()
        )));
    }
    for i in 0..n {
        if !(q[[i, i]] >= 0.0) {
            return Err(BalanceError::ConfigError(format!(
                "Q[{i},{i}] must be >= 0, got {}",
                q[[i, i]]
            )));
        }
        for j in 0..i {
            if (q[[i, j]] - q[[j, i]]).abs() > 1e-12 * (1.0 + q[[i, j]].abs()) {
                return Err(BalanceError::ConfigError("Q must be symmetric".into()));
            }
        }
    }
    if !is_positive_definite(r) {
        return Err(BalanceError::ConfigError(
            "R must be symmetric positive definite".into(),
        ));
    }
    Ok(())
}

/// Solve the LQR problem for `(A, B, Q, R)`.
///
/// `(A, B)` is expected to have passed the controllability check. Fails
/// with `RiccatiDiverged` when the CARE cannot be solved and with
/// `UnstableClosedLoop` when the resulting gain does not stabilize.
pub fn solve_lqr(
    a: &Array2<f64>,
    b: &Array2<f64>,
    q: &Array2<f64>,
    r: &Array2<f64>,
) -> BalanceResult<LqrSolution> {
    validate_weights(q, r, a.nrows(), b.ncols())?;

    let care = solve_care(a, b, q, r)?;
    debug!(
        iterations = care.iterations,
        residual = care.residual,
        "riccati converged"
    );

    let k = invert(r)?.dot(&b.t()).dot(&care.p);
    let closed_loop = a - &b.dot(&k);
    if !is_hurwitz(&closed_loop) {
        return Err(BalanceError::UnstableClosedLoop {
            max_real_part: spectral_abscissa(&closed_loop),
        });
    }
    let closed_loop_poles = eigenvalues(&closed_loop);
    let gain = GainMatrix::new(k)?;

    info!(gain = ?gain.row().to_vec(), "LQR gain K");
    debug!(poles = ?closed_loop_poles, "closed-loop poles");

    Ok(LqrSolution {
        gain,
        riccati: care.p,
        closed_loop_poles,
    })
}
