// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Scenarios
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The three balancing experiments: tilted start, mid-run push, payload
//! sweep.
//!
//! Every scenario checks controllability and synthesizes a gain before it
//! simulates anything. Payload variants are value copies of the base
//! parameters, so the runner itself is never mutated.

use crate::checker::structural_ranks;
use crate::lqr::{solve_lqr, LqrSolution};
use crate::model::build_state_space;
use crate::simulation::{run_simulation, Disturbance, ImpulseDisturbance, SimulationConfig};
use balance_types::config::{
    ActuatorConfig, ExperimentConfig, LqrWeights, MassSweepConfig, PokeConfig, SensorConfig,
};
use balance_types::constants::{INITIAL_TILT_DEG, INITIAL_TILT_RATE};
use balance_types::error::{BalanceError, BalanceResult};
use balance_types::params::PhysicalParameters;
use balance_types::state::{LabeledTrace, SimulationTrace, StateSpaceModel, StateVector};
use tracing::{info, warn};

pub const REGULAR_TITLE: &str = "Regular Balancing Simulation Results";
pub const POKE_TITLE: &str = "Poke Force Simulation Results";
pub const MASS_SWEEP_TITLE: &str = "Object Balancing: All Mass Variations";

/// `[0, 0, 10°, 0.2 rad/s]`
pub fn tilted_start() -> StateVector {
    StateVector::new(0.0, 0.0, INITIAL_TILT_DEG.to_radians(), INITIAL_TILT_RATE)
}

/// Receives scenario results, e.g. a plotter or a logger.
pub trait TraceSink {
    fn present(&mut self, title: &str, runs: &[LabeledTrace]) -> BalanceResult<()>;
}

/// Runs the balancing experiments for one robot and weighting.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    params: PhysicalParameters,
    weights: LqrWeights,
    actuator: ActuatorConfig,
    sensor: SensorConfig,
    poke: PokeConfig,
    sweep: MassSweepConfig,
}

impl ScenarioRunner {
    /// Default weights, actuator, sensor, poke and sweep settings.
    pub fn new(params: PhysicalParameters) -> Self {
        ScenarioRunner {
            params,
            weights: LqrWeights::default(),
            actuator: ActuatorConfig::default(),
            sensor: SensorConfig::default(),
            poke: PokeConfig::default(),
            sweep: MassSweepConfig::default(),
        }
    }

    pub fn from_config(config: &ExperimentConfig) -> BalanceResult<Self> {
        config.validate()?;
        Ok(ScenarioRunner {
            params: config.robot,
            weights: config.weights,
            actuator: config.actuator,
            sensor: config.sensor,
            poke: config.poke,
            sweep: config.mass_sweep,
        })
    }

    pub fn with_weights(mut self, weights: LqrWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_sweep(mut self, sweep: MassSweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn params(&self) -> &PhysicalParameters {
        &self.params
    }

    /// Build the model for `params`, require full structural rank, then
    /// synthesize the LQR gain.
    pub fn design_controller(
        &self,
        params: &PhysicalParameters,
    ) -> BalanceResult<(StateSpaceModel, LqrSolution)> {
        let model = build_state_space(params)?;
        let ranks = structural_ranks(model.a(), model.b());
        if !ranks.is_full() {
            return Err(BalanceError::NotControllable {
                controllability_rank: ranks.controllability,
                observability_rank: ranks.observability,
                state_dim: ranks.state_dim,
            });
        }
        let lqr = solve_lqr(
            model.a(),
            model.b(),
            &self.weights.q_matrix(),
            &self.weights.r_matrix(),
        )?;
        Ok((model, lqr))
    }

    fn sim_config(&self, params: &PhysicalParameters, runtime: f64, dt: f64) -> SimulationConfig {
        SimulationConfig {
            u_max: self.actuator.u_max(params.wheel_radius),
            tau: self.actuator.tau,
            dt,
            runtime,
            sensor: self.sensor,
        }
    }

    /// Recover from a 10° lean with no external force.
    pub fn run_regular_balancing(&self, runtime: f64, dt: f64) -> BalanceResult<SimulationTrace> {
        let (model, lqr) = self.design_controller(&self.params)?;
        let config = self.sim_config(&self.params, runtime, dt);
        let trace = run_simulation(&model, &lqr.gain, &config, tilted_start(), None)?;
        info!(
            samples = trace.len(),
            peak_tilt = trace.peak_abs_angle(),
            "regular balancing finished"
        );
        Ok(trace)
    }

    /// Start upright and take a rectangular push mid-run.
    pub fn run_poke(&self, runtime: f64, dt: f64) -> BalanceResult<SimulationTrace> {
        let (model, lqr) = self.design_controller(&self.params)?;
        let config = self.sim_config(&self.params, runtime, dt);
        let push: &dyn Disturbance =
            &ImpulseDisturbance::new(self.poke.start, self.poke.duration, self.poke.magnitude);
        let trace = run_simulation(&model, &lqr.gain, &config, StateVector::zeros(), Some(push))?;
        info!(
            samples = trace.len(),
            peak_tilt = trace.peak_abs_angle(),
            "poke finished"
        );
        Ok(trace)
    }

    /// Repeat the tilted-start run for every payload in the sweep.
    ///
    /// Each payload gets a fresh model. The base gain is reused unless
    /// `retune_per_payload` is set.
    pub fn run_mass_sweep(&self, runtime: f64, dt: f64) -> BalanceResult<Vec<LabeledTrace>> {
        let masses = self.sweep.extra_masses()?;
        let (_, base) = self.design_controller(&self.params)?;
        let mut runs = Vec::with_capacity(masses.len());

        for extra in masses {
            let loaded = self.params.with_payload(extra);
            let (model, gain) = if self.sweep.retune_per_payload {
                let (model, lqr) = self.design_controller(&loaded)?;
                (model, lqr.gain)
            } else {
                (build_state_space(&loaded)?, base.gain.clone())
            };
            let config = self.sim_config(&loaded, runtime, dt);
            let trace = run_simulation(&model, &gain, &config, tilted_start(), None)?;
            if !trace.is_finite() {
                warn!(extra_mass = extra, "sweep run diverged to non-finite state");
            }
            let label = self.sweep.label(extra);
            info!(%label, peak_tilt = trace.peak_abs_angle(), "sweep run finished");
            runs.push(LabeledTrace::new(label, trace));
        }
        Ok(runs)
    }

    /// Run all three scenarios and hand each result to `sink`.
    pub fn run_all(&self, runtime: f64, dt: f64, sink: &mut dyn TraceSink) -> BalanceResult<()> {
        let regular = self.run_regular_balancing(runtime, dt)?;
        sink.present(REGULAR_TITLE, &[LabeledTrace::new("regular", regular)])?;

        let poke = self.run_poke(runtime, dt)?;
        sink.present(POKE_TITLE, &[LabeledTrace::new("poke", poke)])?;

        let sweep = self.run_mass_sweep(runtime, dt)?;
        sink.present(MASS_SWEEP_TITLE, &sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilted_start() {
        let x0 = tilted_start();
        assert!((x0.tilt() - 10.0_f64.to_radians()).abs() < 1e-15);
        assert_eq!(x0.tilt_rate(), 0.2);
        assert_eq!(x0.position(), 0.0);
    }

    #[test]
    fn test_design_controller_default() {
        let runner = ScenarioRunner::new(PhysicalParameters::default());
        let (model, lqr) = runner.design_controller(runner.params()).unwrap();
        assert_eq!(model.a().dim(), (4, 4));
        assert!(lqr.spectral_abscissa() < 0.0);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut cfg = ExperimentConfig::default();
        cfg.timing.dt = 0.0;
        assert!(ScenarioRunner::from_config(&cfg).is_err());
    }

    #[test]
    fn test_short_sweep_labels() {
        let runner = ScenarioRunner::new(PhysicalParameters::default())
            .with_sensor(SensorConfig::ideal())
            .with_sweep(MassSweepConfig {
                low: 0.0,
                high: 1.0,
                step: 0.5,
                retune_per_payload: true,
            });
        let runs = runner.run_mass_sweep(0.05, 0.001).unwrap();
        let labels: Vec<&str> = runs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["+0.0kg", "+0.5kg", "+1.0kg"]);
        assert!(runs.iter().all(|r| r.trace.len() == 50));
        assert_eq!(runner.params().body_mass, 2.0);
    }

    #[test]
    fn test_inverted_sweep_range_is_error() {
        let runner = ScenarioRunner::new(PhysicalParameters::default()).with_sweep(MassSweepConfig {
            low: 5.0,
            high: 1.0,
            ..MassSweepConfig::default()
        });
        assert!(matches!(
            runner.run_mass_sweep(0.01, 0.001),
            Err(BalanceError::ConfigError(_))
        ));
    }

    #[test]
    fn test_quarter_kilo_sweep_labels_unique() {
        let runner = ScenarioRunner::new(PhysicalParameters::default())
            .with_sensor(SensorConfig::ideal())
            .with_sweep(MassSweepConfig {
                low: 0.0,
                high: 0.5,
                step: 0.25,
                retune_per_payload: false,
            });
        let runs = runner.run_mass_sweep(0.01, 0.001).unwrap();
        let labels: Vec<&str> = runs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["+0.00kg", "+0.25kg", "+0.50kg"]);
    }

    #[test]
    fn test_weights_change_gain() {
        let base = ScenarioRunner::new(PhysicalParameters::default());
        let soft = base.clone().with_weights(LqrWeights {
            q: [10.0, 1.0, 100.0, 1.0],
            r: 1.0,
        });
        let (_, stiff_lqr) = base.design_controller(base.params()).unwrap();
        let (_, soft_lqr) = soft.design_controller(soft.params()).unwrap();
        // K[0] = −√(q₀/r)
        assert!((stiff_lqr.gain.row()[0] + 1000.0_f64.sqrt()).abs() < 1e-6);
        assert!((soft_lqr.gain.row()[0] + 10.0_f64.sqrt()).abs() < 1e-6);
    }
}
