// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    INPUT_DIM, MOTOR_TAU, Q_DIAG, RATED_TORQUE, R_WEIGHT, STATE_DIM,
    TILT_LPF_ALPHA, TILT_NOISE_STD_DEG,
};
use crate::error::{BalanceError, BalanceResult};
use crate::params::PhysicalParameters;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Top-level experiment configuration.
/// Maps 1:1 to configs/balancebot.json; every section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub robot: PhysicalParameters,
    #[serde(default)]
    pub weights: LqrWeights,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub poke: PokeConfig,
    #[serde(default)]
    pub mass_sweep: MassSweepConfig,
}

/// Diagonal LQR weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LqrWeights {
    /// Penalty on [x, ẋ, θ, θ̇] deviation.
    pub q: [f64; STATE_DIM],
    /// Penalty on control effort.
    pub r: f64,
}

impl Default for LqrWeights {
    fn default() -> Self {
        LqrWeights {
            q: Q_DIAG,
            r: R_WEIGHT,
        }
    }
}

impl LqrWeights {
    pub fn q_matrix(&self) -> Array2<f64> {
        Array2::from_diag(&ndarray::arr1(&self.q))
    }

    pub fn r_matrix(&self) -> Array2<f64> {
        Array2::from_elem((INPUT_DIM, INPUT_DIM), self.r)
    }

    pub fn validate(&self) -> BalanceResult<()> {
        if let Some(bad) = self.q.iter().find(|q| !q.is_finite() || **q < 0.0) {
            return Err(BalanceError::ConfigError(format!(
                "Q weights must be finite and >= 0, got {bad}"
            )));
        }
        if !self.r.is_finite() || self.r <= 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "R weight must be finite and > 0, got {}",
                self.r
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Motor time constant [s]
    #[serde(default = "default_tau")]
    pub tau: f64,
    /// Rated motor torque [N·m]
    #[serde(default = "default_rated_torque")]
    pub rated_torque: f64,
}

fn default_tau() -> f64 {
    MOTOR_TAU
}
fn default_rated_torque() -> f64 {
    RATED_TORQUE
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        ActuatorConfig {
            tau: default_tau(),
            rated_torque: default_rated_torque(),
        }
    }
}

impl ActuatorConfig {
    /// Saturation bound `Tmax / rw`.
    pub fn u_max(&self, wheel_radius: f64) -> f64 {
        self.rated_torque / wheel_radius
    }

    pub fn validate(&self) -> BalanceResult<()> {
        if !self.tau.is_finite() || self.tau < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "actuator tau must be finite and >= 0, got {}",
                self.tau
            )));
        }
        if !self.rated_torque.is_finite() || self.rated_torque <= 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "rated_torque must be finite and > 0, got {}",
                self.rated_torque
            )));
        }
        Ok(())
    }
}

/// Tilt sensor model. `seed = None` draws from OS entropy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_noise_std_deg")]
    pub noise_std_deg: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_noise_std_deg() -> f64 {
    TILT_NOISE_STD_DEG
}
fn default_alpha() -> f64 {
    TILT_LPF_ALPHA
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            enabled: true,
            noise_std_deg: default_noise_std_deg(),
            alpha: default_alpha(),
            seed: None,
        }
    }
}

impl SensorConfig {
    /// Ideal sensor: no noise, no filtering.
    pub fn ideal() -> Self {
        SensorConfig {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn seeded(seed: u64) -> Self {
        SensorConfig {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn noise_std_rad(&self) -> f64 {
        self.noise_std_deg.to_radians()
    }

    pub fn validate(&self) -> BalanceResult<()> {
        if !self.noise_std_deg.is_finite() || self.noise_std_deg < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "noise_std_deg must be finite and >= 0, got {}",
                self.noise_std_deg
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(BalanceError::ConfigError(format!(
                "filter alpha must lie in (0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Integration step [s]
    pub dt: f64,
    /// Simulation horizon [s]
    pub runtime: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            dt: 0.001,
            runtime: 10.0,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> BalanceResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        if !self.runtime.is_finite() || self.runtime < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "runtime must be finite and >= 0, got {}",
                self.runtime
            )));
        }
        Ok(())
    }
}

/// Rectangular push applied through E.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PokeConfig {
    pub start: f64,
    pub duration: f64,
    pub magnitude: f64,
}

impl Default for PokeConfig {
    fn default() -> Self {
        PokeConfig {
            start: 5.0,
            duration: 0.1,
            magnitude: 10.0,
        }
    }
}

/// Payload sweep `[low, high]` in steps of `step`, both ends included
/// when the step lands on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassSweepConfig {
    pub low: f64,
    pub high: f64,
    #[serde(default = "default_sweep_step")]
    pub step: f64,
    /// Re-synthesize K for each payload instead of reusing the base gain.
    #[serde(default)]
    pub retune_per_payload: bool,
}

fn default_sweep_step() -> f64 {
    1.0
}

impl Default for MassSweepConfig {
    fn default() -> Self {
        MassSweepConfig {
            low: 0.5,
            high: 8.0,
            step: default_sweep_step(),
            retune_per_payload: false,
        }
    }
}

/// Slack so `high` survives float error in `low + i·step`.
const SWEEP_EPS: f64 = 1e-9;

/// Finest payload increment; labels carry at most three decimals [kg].
const MIN_SWEEP_STEP: f64 = 1e-3;

/// Upper bound on the number of payload runs in one sweep.
const MAX_SWEEP_RUNS: usize = 10_000;

impl MassSweepConfig {
    /// Extra masses visited by the sweep, ascending.
    pub fn extra_masses(&self) -> BalanceResult<Vec<f64>> {
        self.validate()?;
        let n = self.run_count();
        Ok((0..n).map(|i| self.low + i as f64 * self.step).collect())
    }

    fn run_count(&self) -> usize {
        ((self.high - self.low) / self.step + SWEEP_EPS).floor() as usize + 1
    }

    /// Decimals needed so that every label on the grid is distinct.
    fn label_decimals(&self) -> usize {
        let on_grid = |v: f64, d: i32| {
            let scaled = v * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6
        };
        (1..=3)
            .find(|&d| on_grid(self.low, d) && on_grid(self.step, d))
            .unwrap_or(3) as usize
    }

    /// Plot label for one payload, e.g. `"+2.5kg"` or `"+0.25kg"`.
    pub fn label(&self, extra_mass: f64) -> String {
        format!("+{:.*}kg", self.label_decimals(), extra_mass)
    }

    pub fn validate(&self) -> BalanceResult<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.high < self.low {
            return Err(BalanceError::ConfigError(format!(
                "mass sweep needs finite low <= high, got [{}, {}]",
                self.low, self.high
            )));
        }
        if !self.step.is_finite() || self.step < MIN_SWEEP_STEP {
            return Err(BalanceError::ConfigError(format!(
                "mass sweep step must be finite and >= {MIN_SWEEP_STEP}, got {}",
                self.step
            )));
        }
        if (self.high - self.low) / self.step >= MAX_SWEEP_RUNS as f64 {
            return Err(BalanceError::ConfigError(format!(
                "mass sweep [{}, {}] step {} exceeds {MAX_SWEEP_RUNS} runs",
                self.low, self.high, self.step
            )));
        }
        Ok(())
    }
}

impl ExperimentConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> BalanceResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BalanceResult<()> {
        self.robot.validate()?;
        self.weights.validate()?;
        self.actuator.validate()?;
        self.sensor.validate()?;
        self.timing.validate()?;
        self.mass_sweep.validate()?;
        if !self.poke.start.is_finite()
            || !self.poke.duration.is_finite()
            || self.poke.duration < 0.0
            || !self.poke.magnitude.is_finite()
        {
            return Err(BalanceError::ConfigError(format!(
                "invalid poke window {:?}",
                self.poke
            )));
        }
        Ok(())
    }

    /// Saturation bound derived from the motor and wheel.
    pub fn u_max(&self) -> f64 {
        self.actuator.u_max(self.robot.wheel_radius)
    }
}
