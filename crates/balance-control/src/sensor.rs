// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Sensor
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Noisy tilt measurement followed by an exponential low-pass filter.
//!
//! Only the tilt channel is corrupted and filtered; position and the two
//! rates pass through. The generator is injected so seeded runs repeat
//! bit for bit.

use balance_types::config::SensorConfig;
use balance_types::error::{BalanceError, BalanceResult};
use balance_types::state::StateVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

struct NoiseSource<R> {
    rng: R,
    normal: Normal<f64>,
}

/// Per-run tilt sensor. Create a fresh one for every simulation run.
pub struct SensorFilter<R: Rng = StdRng> {
    noise: Option<NoiseSource<R>>,
    alpha: f64,
    last_sensed_theta: f64,
}

impl<R: Rng> SensorFilter<R> {
    /// Gaussian tilt noise with standard deviation `std_rad`, filter gain
    /// `alpha ∈ (0, 1]`.
    pub fn noisy(rng: R, std_rad: f64, alpha: f64) -> BalanceResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(BalanceError::ConfigError(format!(
                "filter alpha must lie in (0, 1], got {alpha}"
            )));
        }
        if !std_rad.is_finite() || std_rad < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "tilt noise std must be finite and >= 0, got {std_rad}"
            )));
        }
        let normal = Normal::new(0.0, std_rad).map_err(|e| {
            BalanceError::ConfigError(format!("invalid tilt noise std {std_rad}: {e}"))
        })?;
        Ok(SensorFilter {
            noise: Some(NoiseSource { rng, normal }),
            alpha,
            last_sensed_theta: 0.0,
        })
    }

    /// Pass-through sensor.
    pub fn ideal() -> Self {
        SensorFilter {
            noise: None,
            alpha: 1.0,
            last_sensed_theta: 0.0,
        }
    }

    pub fn is_ideal(&self) -> bool {
        self.noise.is_none()
    }

    pub fn last_sensed_theta(&self) -> f64 {
        self.last_sensed_theta
    }

    /// Measure `true_state`. Draws exactly one sample per call when noisy.
    pub fn process(&mut self, true_state: &StateVector) -> StateVector {
        let Some(source) = self.noise.as_mut() else {
            return *true_state;
        };
        let noisy_theta = true_state.tilt() + source.normal.sample(&mut source.rng);
        self.last_sensed_theta =
            self.alpha * noisy_theta + (1.0 - self.alpha) * self.last_sensed_theta;
        true_state.with_tilt(self.last_sensed_theta)
    }
}

impl SensorFilter<StdRng> {
    /// Build from configuration. A missing seed draws from OS entropy.
    pub fn from_config(config: &SensorConfig) -> BalanceResult<Self> {
        if !config.enabled {
            return Ok(Self::ideal());
        }
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::noisy(rng, config.noise_std_rad(), config.alpha)
    }
}
