//! Run the three balancing scenarios and log a summary of every trace.
//!
//! Usage:
//! cargo run --bin balance-scenarios -- --config configs/balancebot.json
//! cargo run --bin balance-scenarios -- --seed 42 --runtime 5

use balance_control::scenarios::{ScenarioRunner, TraceSink};
use balance_types::config::ExperimentConfig;
use balance_types::error::BalanceResult;
use balance_types::state::LabeledTrace;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "balance-scenarios")]
#[command(version, about = "LQR balancing experiments for a two-wheeled robot", long_about = None)]
struct Cli {
    /// Experiment configuration (JSON). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for the tilt sensor noise
    #[arg(long)]
    seed: Option<u64>,

    /// Ideal sensor: no noise, no filtering
    #[arg(long)]
    no_noise: bool,

    /// Simulated time per run [s]
    #[arg(long)]
    runtime: Option<f64>,

    /// Integration step [s]
    #[arg(long)]
    dt: Option<f64>,

    /// Log model matrices, poles and per-run diagnostics
    #[arg(short, long)]
    verbose: bool,
}

/// Logs one line per run instead of plotting.
struct LoggingSink;

impl TraceSink for LoggingSink {
    fn present(&mut self, title: &str, runs: &[LabeledTrace]) -> BalanceResult<()> {
        info!("=== {} ===", title);
        for run in runs {
            let trace = &run.trace;
            if let Some(idx) = trace.first_non_finite() {
                warn!(
                    "{}: non-finite state at t = {:.3}s",
                    run.label,
                    trace.time()[idx]
                );
                continue;
            }
            let final_tilt = trace.final_state().map_or(0.0, |x| x.tilt());
            info!(
                "{}: {} samples, peak |θ| = {:.3}°, final θ = {:.4}°",
                run.label,
                trace.len(),
                trace.peak_abs_angle().to_degrees(),
                final_tilt.to_degrees()
            );
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.sensor.seed = Some(seed);
    }
    if cli.no_noise {
        config.sensor.enabled = false;
    }
    if let Some(runtime) = cli.runtime {
        config.timing.runtime = runtime;
    }
    if let Some(dt) = cli.dt {
        config.timing.dt = dt;
    }

    let runner = ScenarioRunner::from_config(&config)?;
    info!(
        body_mass = runner.params().body_mass,
        u_max = config.u_max(),
        runtime = config.timing.runtime,
        dt = config.timing.dt,
        "starting balance scenarios"
    );
    runner.run_all(config.timing.runtime, config.timing.dt, &mut LoggingSink)?;
    Ok(())
}
