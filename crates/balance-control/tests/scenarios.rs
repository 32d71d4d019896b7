// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — End-to-End Scenario Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Full 10 s runs of the three balancing scenarios at default settings.

use balance_control::scenarios::{
    ScenarioRunner, TraceSink, MASS_SWEEP_TITLE, POKE_TITLE, REGULAR_TITLE,
};
use balance_types::config::{ExperimentConfig, MassSweepConfig, SensorConfig};
use balance_types::error::BalanceResult;
use balance_types::params::PhysicalParameters;
use balance_types::state::LabeledTrace;

const RUNTIME: f64 = 10.0;
const DT: f64 = 0.001;

fn runner(sensor: SensorConfig) -> ScenarioRunner {
    ScenarioRunner::new(PhysicalParameters::default()).with_sensor(sensor)
}

#[test]
fn regular_balancing_recovers_upright() {
    let initial = 10.0_f64.to_radians();
    for sensor in [SensorConfig::seeded(42), SensorConfig::ideal()] {
        let trace = runner(sensor).run_regular_balancing(RUNTIME, DT).unwrap();
        assert_eq!(trace.len(), 10_000);
        assert!(trace.is_finite());
        let final_tilt = trace.final_state().unwrap().tilt();
        assert!(
            final_tilt.abs() < initial,
            "final tilt {final_tilt} not below initial {initial}"
        );
        // Settles well within a degree
        assert!(final_tilt.abs() < 1.0_f64.to_radians());
    }
}

#[test]
fn poke_disturbs_then_decays() {
    let trace = runner(SensorConfig::ideal()).run_poke(RUNTIME, DT).unwrap();
    let t = trace.time();
    let theta = trace.angle();

    assert!(t.iter().zip(theta).filter(|(t, _)| **t < 5.0).all(|(_, th)| *th == 0.0));

    let peak = t
        .iter()
        .zip(theta)
        .filter(|(t, _)| **t >= 5.0 && **t <= 5.5)
        .fold(0.0_f64, |acc, (_, th)| acc.max(th.abs()));
    assert!(peak > 1e-3, "peak after push only {peak}");

    let final_tilt = trace.final_state().unwrap().tilt().abs();
    assert!(final_tilt < 0.1 * peak, "final {final_tilt} vs peak {peak}");
}

#[test]
fn mass_sweep_covers_range_and_keeps_base() {
    let runner = runner(SensorConfig::seeded(42));
    let base_mass = runner.params().body_mass;
    let runs = runner.run_mass_sweep(RUNTIME, DT).unwrap();

    let labels: Vec<&str> = runs.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        ["+0.5kg", "+1.5kg", "+2.5kg", "+3.5kg", "+4.5kg", "+5.5kg", "+6.5kg", "+7.5kg"]
    );
    for run in &runs {
        assert_eq!(run.trace.len(), 10_000);
        assert!(run.trace.is_finite(), "{} diverged", run.label);
        let final_tilt = run.trace.final_state().unwrap().tilt();
        assert!(final_tilt.abs() < 10.0_f64.to_radians(), "{}", run.label);
    }
    assert_eq!(runner.params().body_mass, base_mass);
}

#[test]
fn retuned_sweep_also_balances() {
    let runner = runner(SensorConfig::ideal()).with_sweep(MassSweepConfig {
        retune_per_payload: true,
        ..MassSweepConfig::default()
    });
    let runs = runner.run_mass_sweep(RUNTIME, DT).unwrap();
    assert_eq!(runs.len(), 8);
    for run in &runs {
        let final_tilt = run.trace.final_state().unwrap().tilt();
        assert!(final_tilt.abs() < 1.0_f64.to_radians(), "{}", run.label);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let a = runner(SensorConfig::seeded(7)).run_regular_balancing(1.0, DT).unwrap();
    let b = runner(SensorConfig::seeded(7)).run_regular_balancing(1.0, DT).unwrap();
    assert_eq!(a, b);

    let c = runner(SensorConfig::seeded(8)).run_regular_balancing(1.0, DT).unwrap();
    assert_ne!(a.angle(), c.angle());
}

#[derive(Default)]
struct RecordingSink {
    shown: Vec<(String, usize)>,
}

impl TraceSink for RecordingSink {
    fn present(&mut self, title: &str, runs: &[LabeledTrace]) -> BalanceResult<()> {
        self.shown.push((title.to_string(), runs.len()));
        Ok(())
    }
}

#[test]
fn run_all_presents_each_scenario() {
    let mut config = ExperimentConfig::default();
    config.sensor = SensorConfig::seeded(1);
    let runner = ScenarioRunner::from_config(&config).unwrap();

    let mut sink = RecordingSink::default();
    runner.run_all(0.5, DT, &mut sink).unwrap();

    assert_eq!(
        sink.shown,
        vec![
            (REGULAR_TITLE.to_string(), 1),
            (POKE_TITLE.to_string(), 1),
            (MASS_SWEEP_TITLE.to_string(), 8),
        ]
    );
}

#[test]
fn shipped_config_matches_defaults() {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("configs")
        .join("balancebot.json");
    let config = ExperimentConfig::from_file(path.to_str().unwrap()).unwrap();
    let runner = ScenarioRunner::from_config(&config).unwrap();
    assert_eq!(*runner.params(), PhysicalParameters::default());
    assert!((config.u_max() - 35.3).abs() < 1e-9);
}
