// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Physical Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical description of the two-wheeled robot.
//!
//! The body inertia is not a field: it is always `(1/3)·mb·l²`, so a
//! mass change can never leave a stale inertia behind.

use crate::constants::{
    BODY_MASS, GRAVITY, PENDULUM_LENGTH, WHEEL_INERTIA, WHEEL_MASS, WHEEL_RADIUS,
};
use crate::error::{BalanceError, BalanceResult};
use serde::{Deserialize, Serialize};

/// Immutable robot parameters. Copy it, never share it mutably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParameters {
    /// Pendulum body mass `mb` [kg]
    #[serde(default = "default_body_mass")]
    pub body_mass: f64,
    /// Wheel mass `mw` [kg]
    #[serde(default = "default_wheel_mass")]
    pub wheel_mass: f64,
    /// Pendulum length `l` [m]
    #[serde(default = "default_pendulum_length")]
    pub pendulum_length: f64,
    /// Gravitational acceleration `g` [m/s²]
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Wheel moment of inertia `iw` [kg·m²]
    #[serde(default = "default_wheel_inertia")]
    pub wheel_inertia: f64,
    /// Wheel radius `rw` [m]
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,
}

fn default_body_mass() -> f64 {
    BODY_MASS
}
fn default_wheel_mass() -> f64 {
    WHEEL_MASS
}
fn default_pendulum_length() -> f64 {
    PENDULUM_LENGTH
}
fn default_gravity() -> f64 {
    GRAVITY
}
fn default_wheel_inertia() -> f64 {
    WHEEL_INERTIA
}
fn default_wheel_radius() -> f64 {
    WHEEL_RADIUS
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        PhysicalParameters {
            body_mass: BODY_MASS,
            wheel_mass: WHEEL_MASS,
            pendulum_length: PENDULUM_LENGTH,
            gravity: GRAVITY,
            wheel_inertia: WHEEL_INERTIA,
            wheel_radius: WHEEL_RADIUS,
        }
    }
}

impl PhysicalParameters {
    /// Body moment of inertia `ib = (1/3)·mb·l²` (rod about its end).
    pub fn body_inertia(&self) -> f64 {
        self.body_mass * self.pendulum_length * self.pendulum_length / 3.0
    }

    /// Copy with a new body mass; the inertia follows automatically.
    pub fn with_body_mass(&self, body_mass: f64) -> Self {
        PhysicalParameters { body_mass, ..*self }
    }

    /// Copy carrying an extra payload on the body.
    pub fn with_payload(&self, extra_mass: f64) -> Self {
        self.with_body_mass(self.body_mass + extra_mass)
    }

    pub fn validate(&self) -> BalanceResult<()> {
        let fields = [
            ("body_mass", self.body_mass),
            ("wheel_mass", self.wheel_mass),
            ("pendulum_length", self.pendulum_length),
            ("gravity", self.gravity),
            ("wheel_radius", self.wheel_radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(BalanceError::ConfigError(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if !self.wheel_inertia.is_finite() || self.wheel_inertia < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "wheel_inertia must be finite and >= 0, got {}",
                self.wheel_inertia
            )));
        }
        Ok(())
    }
}
