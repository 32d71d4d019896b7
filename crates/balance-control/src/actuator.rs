// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Actuator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! First-order motor lag between commanded and delivered wheel force.

use balance_types::error::{BalanceError, BalanceResult};

/// One Euler step of `τ·u̇ = u_cmd − u`.
///
/// The blend `dt/τ` is capped at 1 so a lag shorter than the step tracks
/// the command exactly instead of overshooting; `τ ≤ 0` is instantaneous.
pub fn actuator_step(u_cmd: f64, u_prev: f64, dt: f64, tau: f64) -> f64 {
    let blend = if tau > 0.0 { (dt / tau).min(1.0) } else { 1.0 };
    u_prev + (u_cmd - u_prev) * blend
}

/// Running actuator state for a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorLag {
    tau: f64,
    u_actual: f64,
}

impl ActuatorLag {
    /// Starts at rest (`u = 0`).
    pub fn new(tau: f64) -> BalanceResult<Self> {
        if !tau.is_finite() || tau < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "actuator tau must be finite and >= 0, got {tau}"
            )));
        }
        Ok(ActuatorLag { tau, u_actual: 0.0 })
    }

    /// Advance by `dt` toward `u_cmd`; returns the delivered force.
    pub fn step(&mut self, u_cmd: f64, dt: f64) -> f64 {
        self.u_actual = actuator_step(u_cmd, self.u_actual, dt, self.tau);
        self.u_actual
    }

    pub fn output(&self) -> f64 {
        self.u_actual
    }
}
