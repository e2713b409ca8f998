//! Simulated training loop exercising the stats tracker.
//!
//! Usage:
//!   stats-demo [OPTIONS]
//!
//! Examples:
//!   # Default run: 200 iterations, progress line every 10 steps
//!   stats-demo
//!
//!   # Custom run with a config file
//!   stats-demo --iterations 1000 --print-every 25 --config stats.json

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use training_stats::{
    ConsolePresenter, PresenterConfig, ProcessRole, Stat, StatsConfig, StatsTracker,
};

#[derive(Parser)]
#[command(name = "stats-demo")]
#[command(about = "Run a simulated training loop through the stats tracker")]
struct Args {
    /// Number of simulated iterations
    #[arg(long, default_value_t = 200)]
    iterations: u64,

    /// Emit a progress line every N steps
    #[arg(long, default_value_t = 10)]
    print_every: u64,

    /// Samples per simulated batch
    #[arg(long, default_value_t = 4096)]
    batch_size: u64,

    /// Optional JSON stats configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let role = ProcessRole::detect();
    if !role.is_main() {
        tracing::info!(rank = role.rank(), "non-main process, nothing to do");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => StatsConfig::load(path)?,
        None => StatsConfig {
            max_iterations: args.iterations,
            ..StatsConfig::default()
        },
    };
    let max_iterations = config.max_iterations;

    let mut tracker = StatsTracker::new(config, role)?;
    let mut presenter = ConsolePresenter::stdout(PresenterConfig {
        print_every: args.print_every,
    });

    let run_start = Instant::now();
    let mut clock = 0.0_f64;
    for step in 1..=max_iterations {
        // Synthetic per-iteration timings: a slow warmup that settles down.
        let load_secs = 0.004 + 2.0 / (step as f64 + 100.0);
        let iter_secs = 0.020 + 5.0 / (step as f64 + 50.0);

        let load_start = clock;
        clock += load_secs;
        tracker.record_interval(Stat::DataLoadTime, load_start, clock, Some(step), None)?;

        let iter_start = clock;
        clock += iter_secs;
        tracker.record_interval(Stat::IterTime, iter_start, clock, Some(step), None)?;
        tracker.record_interval(
            Stat::SamplesPerSec,
            iter_start,
            clock,
            Some(step),
            Some(args.batch_size),
        )?;
        tracker.record_interval(
            Stat::TotalTrainTime,
            0.0,
            run_start.elapsed().as_secs_f64(),
            None,
            None,
        )?;

        if presenter.should_print(step) {
            let fraction_done = step as f64 / max_iterations as f64;
            presenter.present(&tracker.snapshot_for_display(fraction_done)?)?;
        }
    }

    tracing::info!(steps = max_iterations, "simulated run complete");
    Ok(())
}
