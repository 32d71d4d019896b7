// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Structural Checks
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Controllability and observability rank tests.
//!
//! Observability uses full-state output (`C = I`), so it holds for any `A`;
//! it is computed anyway so both ranks are reported together.

use balance_math::linalg::matrix_rank;
use ndarray::{s, Array2};
use tracing::debug;

/// Numerical ranks of the two structural matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralRanks {
    pub controllability: usize,
    pub observability: usize,
    pub state_dim: usize,
}

impl StructuralRanks {
    pub fn is_full(&self) -> bool {
        self.controllability == self.state_dim && self.observability == self.state_dim
    }
}

/// `[B, AB, A²B, …, Aⁿ⁻¹B]`, n × n·m.
pub fn controllability_matrix(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let m = b.ncols();
    let mut ctrb = Array2::<f64>::zeros((n, n * m));
    let mut block = b.clone();
    for k in 0..n {
        ctrb.slice_mut(s![.., k * m..(k + 1) * m]).assign(&block);
        block = a.dot(&block);
    }
    ctrb
}

/// `[C; CA; CA²; …; CAⁿ⁻¹]`, n·p × n.
pub fn observability_matrix(a: &Array2<f64>, c: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let p = c.nrows();
    let mut obsv = Array2::<f64>::zeros((n * p, n));
    let mut block = c.clone();
    for k in 0..n {
        obsv.slice_mut(s![k * p..(k + 1) * p, ..]).assign(&block);
        block = block.dot(a);
    }
    obsv
}

/// Ranks of the controllability matrix of `(A, B)` and the observability
/// matrix of `(A, I)`.
pub fn structural_ranks(a: &Array2<f64>, b: &Array2<f64>) -> StructuralRanks {
    let n = a.nrows();
    let ctrb = controllability_matrix(a, b);
    let obsv = observability_matrix(a, &Array2::eye(n));
    let ranks = StructuralRanks {
        controllability: matrix_rank(&ctrb, None),
        observability: matrix_rank(&obsv, None),
        state_dim: n,
    };
    debug!(
        ctrb_rank = ranks.controllability,
        obsv_rank = ranks.observability,
        n,
        "structural ranks"
    );
    ranks
}

/// `true` iff both matrices have full rank.
pub fn check(a: &Array2<f64>, b: &Array2<f64>) -> bool {
    structural_ranks(a, b).is_full()
}
