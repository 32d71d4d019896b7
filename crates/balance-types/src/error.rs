// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Singular mass matrix: det(M) = {det:e}")]
    SingularMassMatrix { det: f64 },

    #[error(
        "System is not controllable and/or observable: \
         rank(ctrb)={controllability_rank}, rank(obsv)={observability_rank}, n={state_dim}"
    )]
    NotControllable {
        controllability_rank: usize,
        observability_rank: usize,
        state_dim: usize,
    },

    #[error("Riccati solver failed after {iterations} iterations (residual {residual:e})")]
    RiccatiDiverged { iterations: usize, residual: f64 },

    #[error("Closed loop is not stable: max Re(λ) = {max_real_part}")]
    UnstableClosedLoop { max_real_part: f64 },

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BalanceResult<T> = Result<T, BalanceError>;
