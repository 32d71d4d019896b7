// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Simulation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step closed-loop simulation.
//!
//! Per step: disturbance, sensor, `u = −K·x̂`, saturation, actuator lag,
//! dynamics, record the state *before* integration, then forward Euler.
//! Non-finite states are not caught here; inspect the returned trace with
//! [`SimulationTrace::first_non_finite`].

use crate::actuator::ActuatorLag;
use crate::sensor::SensorFilter;
use balance_types::config::SensorConfig;
use balance_types::error::{BalanceError, BalanceResult};
use balance_types::state::{GainMatrix, SimulationTrace, StateSpaceModel, StateVector};
use rand::Rng;
use tracing::debug;

/// Guards `runtime/dt` against representation error (10/0.001 → 9999.999…).
const STEP_EPS: f64 = 1e-9;

/// Longest run accepted; the trace keeps five samples per step.
pub const MAX_STEPS: usize = 50_000_000;

/// Per-run settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Saturation bound on the commanded force [N].
    pub u_max: f64,
    /// Actuator time constant [s].
    pub tau: f64,
    pub dt: f64,
    pub runtime: f64,
    pub sensor: SensorConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> BalanceResult<()> {
        if !self.u_max.is_finite() || self.u_max <= 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "u_max must be finite and > 0, got {}",
                self.u_max
            )));
        }
        if !self.tau.is_finite() || self.tau < 0.0 {
            return Err(BalanceError::ConfigError(format!(
                "tau must be finite and >= 0, got {}",
                self.tau
            )));
        }
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
        let ratio = self.runtime / self.dt;
        if !ratio.is_finite() || ratio >= MAX_STEPS as f64 {
            return Err(BalanceError::ConfigError(format!(
                "runtime/dt = {ratio:e} exceeds {MAX_STEPS} steps"
            )));
        }
        Ok(())
    }

    /// Number of integration steps, `⌊runtime/dt⌋`.
    pub fn step_count(&self) -> usize {
        (self.runtime / self.dt + STEP_EPS).floor() as usize
    }
}

/// External force `d(t)` entering through `E`.
pub trait Disturbance {
    fn at(&self, t: f64) -> f64;
}

impl<F: Fn(f64) -> f64> Disturbance for F {
    fn at(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Rectangular pulse of `magnitude` on `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseDisturbance {
    pub start: f64,
    pub duration: f64,
    pub magnitude: f64,
}

impl ImpulseDisturbance {
    pub fn new(start: f64, duration: f64, magnitude: f64) -> Self {
        ImpulseDisturbance {
            start,
            duration,
            magnitude,
        }
    }

    pub fn is_active(&self, t: f64) -> bool {
        t >= self.start && t < self.start + self.duration
    }
}

impl Disturbance for ImpulseDisturbance {
    fn at(&self, t: f64) -> f64 {
        if self.is_active(t) {
            self.magnitude
        } else {
            0.0
        }
    }
}

/// Run one simulation with the sensor built from `config.sensor`.
pub fn run_simulation(
    model: &StateSpaceModel,
    gain: &GainMatrix,
    config: &SimulationConfig,
    x0: StateVector,
    disturbance: Option<&dyn Disturbance>,
) -> BalanceResult<SimulationTrace> {
    let sensor = SensorFilter::from_config(&config.sensor)?;
    run_with_sensor(model, gain, config, x0, disturbance, sensor)
}

/// Run one simulation with an explicitly supplied sensor.
///
/// The sensor and a fresh actuator are consumed by this run only.
pub fn run_with_sensor<R: Rng>(
    model: &StateSpaceModel,
    gain: &GainMatrix,
    config: &SimulationConfig,
    x0: StateVector,
    disturbance: Option<&dyn Disturbance>,
    mut sensor: SensorFilter<R>,
) -> BalanceResult<SimulationTrace> {
    config.validate()?;
    let mut actuator = ActuatorLag::new(config.tau)?;
    let steps = config.step_count();
    let mut trace = SimulationTrace::with_capacity(steps);
    let mut x = x0;
    let mut saturated_steps = 0usize;

    for i in 0..steps {
        let t = i as f64 * config.dt;
        let d = disturbance.map_or(0.0, |f| f.at(t));
        let x_sensed = sensor.process(&x);
        let u_raw = gain.feedback(&x_sensed);
        let u_cmd = u_raw.clamp(-config.u_max, config.u_max);
        if u_cmd != u_raw {
            saturated_steps += 1;
        }
        let u_actual = actuator.step(u_cmd, config.dt);
        let x_dot = model.derivative(&x, u_actual, d);
        trace.push(t, &x);
        x = x.euler_step(&x_dot, config.dt);
    }

    debug!(
        steps,
        saturated_steps,
        final_tilt = ?trace.final_state().map(|s| s.tilt()),
        peak_tilt = trace.peak_abs_angle(),
        "simulation finished"
    );
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_state_space;
    use balance_types::params::PhysicalParameters;

    fn config(runtime: f64, dt: f64) -> SimulationConfig {
        SimulationConfig {
            u_max: 35.3,
            tau: 0.02,
            dt,
            runtime,
            sensor: SensorConfig::ideal(),
        }
    }

    fn default_model() -> StateSpaceModel {
        build_state_space(&PhysicalParameters::default()).unwrap()
    }

    #[test]
    fn test_step_count_floor() {
        assert_eq!(config(10.0, 0.001).step_count(), 10_000);
        assert_eq!(config(0.35, 0.1).step_count(), 3);
        assert_eq!(config(0.0, 0.1).step_count(), 0);
    }

    #[test]
    fn test_records_pre_integration_state() {
        let model = default_model();
        let gain = GainMatrix::from_row([0.0; 4]);
        let x0 = StateVector::new(0.0, 1.0, 0.0, 0.0);
        let trace = run_simulation(&model, &gain, &config(0.003, 0.001), x0, None).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.state_at(0), Some(x0));
        assert_eq!(trace.time()[0], 0.0);
        // Free cart coasting: x advances by v·dt each step
        assert!((trace.position()[1] - 0.001).abs() < 1e-15);
        assert!((trace.time()[2] - 0.002).abs() < 1e-15);
    }

    #[test]
    fn test_zero_state_stays_zero_without_disturbance() {
        let model = default_model();
        let gain = GainMatrix::from_row([-31.6, -34.3, -196.3, -32.1]);
        let trace =
            run_simulation(&model, &gain, &config(1.0, 0.001), StateVector::zeros(), None).unwrap();
        assert!(trace.angle().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_saturation_bounds_force() {
        // Huge gain with no lag: the force must still stay within u_max.
        let model = default_model();
        let gain = GainMatrix::from_row([0.0, 0.0, -1e6, 0.0]);
        let mut cfg = config(0.002, 0.001);
        cfg.tau = 0.0;
        let x0 = StateVector::new(0.0, 0.0, 0.1, 0.0);
        let trace = run_simulation(&model, &gain, &cfg, x0, None).unwrap();
        // ẋ after one step = A·x + B·u_max
        let b1 = model.b()[[1, 0]];
        let expected_v = (model.a()[[1, 2]] * 0.1 + b1 * 35.3) * 0.001;
        assert!((trace.velocity()[1] - expected_v).abs() < 1e-12);
    }

    #[test]
    fn test_impulse_window_half_open() {
        let pulse = ImpulseDisturbance::new(5.0, 0.1, 10.0);
        assert_eq!(pulse.at(4.999), 0.0);
        assert_eq!(pulse.at(5.0), 10.0);
        assert_eq!(pulse.at(5.05), 10.0);
        assert_eq!(pulse.at(5.1), 0.0);
    }

    #[test]
    fn test_closure_disturbance() {
        let model = default_model();
        let gain = GainMatrix::from_row([0.0; 4]);
        let push: &dyn Disturbance = &|t: f64| if t < 0.001 { 1.0 } else { 0.0 };
        let trace =
            run_simulation(&model, &gain, &config(0.002, 0.001), StateVector::zeros(), Some(push))
                .unwrap();
        assert!(trace.velocity()[1] > 0.0);
    }

    #[test]
    fn test_nan_propagates() {
        let model = default_model();
        let gain = GainMatrix::from_row([0.0; 4]);
        let x0 = StateVector::new(0.0, 0.0, f64::NAN, 0.0);
        let trace = run_simulation(&model, &gain, &config(0.01, 0.001), x0, None).unwrap();
        assert_eq!(trace.len(), 10);
        assert_eq!(trace.first_non_finite(), Some(0));
        assert!(trace.angle().iter().all(|a| a.is_nan()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let model = default_model();
        let gain = GainMatrix::from_row([0.0; 4]);
        let mut cfg = config(1.0, 0.001);
        cfg.u_max = 0.0;
        assert!(run_simulation(&model, &gain, &cfg, StateVector::zeros(), None).is_err());
        let mut cfg = config(1.0, 0.001);
        cfg.dt = -1.0;
        assert!(run_simulation(&model, &gain, &cfg, StateVector::zeros(), None).is_err());
    }

    #[test]
    fn test_oversized_run_rejected() {
        let model = default_model();
        let gain = GainMatrix::from_row([0.0; 4]);
        let cfg = config(1e10, 1e-300);
        assert!(matches!(cfg.validate(), Err(BalanceError::ConfigError(_))));
        assert!(run_simulation(&model, &gain, &cfg, StateVector::zeros(), None).is_err());
        assert!(config(MAX_STEPS as f64, 1.0).validate().is_err());
        assert!(config(10.0, 0.001).validate().is_ok());
    }
}
