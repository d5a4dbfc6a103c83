//! The command line front end: loads a configuration, executes the batch and writes the
//! reports.
//!
//! ```text
//! seiqhrf --config model.json [--random-seed N] [--output-dir DIR]
//!         [--log-level LEVEL|module=LEVEL,...] [-v...] [--ncores N] [--nsims N]
//!         [--time-budget 30s] [--no-stats] [--progress]
//! ```
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::batch::{BatchResult, SimulationBatch};
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::execution_stats::{log_execution_statistics, print_execution_statistics};
use crate::log::{info, set_log_level, warn, LevelFilter, LogSpec};
use crate::report::write_batch_reports;

/// Default command line arguments of the simulator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seiqhrf",
    version,
    about = "Individual-based stochastic SEIQHRF epidemic simulator"
)]
pub struct BaseArgs {
    /// Path of the JSON model configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// Base random seed, overriding `seed` in the configuration
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Directory for the CSV reports. No reports are written without it
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Global log level and per-module levels, e.g. `info` or `seiqhrf::engine=trace,warn`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Worker threads, overriding `ncores` in the configuration
    #[arg(long)]
    pub ncores: Option<usize>,

    /// Number of runs, overriding `nsims` in the configuration
    #[arg(long)]
    pub nsims: Option<usize>,

    /// Wall-clock budget; runs not started in time are cancelled (e.g. `30s`, `5m`)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub time_budget: Option<Duration>,

    /// Do not print the execution summary
    #[arg(long)]
    pub no_stats: bool,

    /// Show a progress bar over completed runs
    #[cfg(feature = "progress_bar")]
    #[arg(long)]
    pub progress: bool,
}

fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn setup_logging(args: &BaseArgs) -> Result<(), ModelError> {
    if let Some(spec) = &args.log_level {
        let spec: LogSpec = spec.parse()?;
        let spec = LogSpec {
            level: spec.level.or_else(|| {
                (args.verbose > 0).then(|| verbosity_level(args.verbose))
            }),
            ..spec
        };
        spec.apply();
        if let Some(level) = spec.level {
            println!("Logging enabled at level {level}");
        }
        for (module, level) in &spec.modules {
            println!("Logging enabled for {module} at level {level}");
        }
    } else if args.verbose > 0 {
        let level = verbosity_level(args.verbose);
        set_log_level(level);
        println!("Logging enabled at level {level}");
    }
    Ok(())
}

/// Applies the command line overrides to a configuration.
fn apply_overrides(config: &mut ModelConfig, args: &BaseArgs) {
    if let Some(seed) = args.random_seed {
        config.seed = seed;
    }
    if let Some(ncores) = args.ncores {
        config.ncores = ncores;
    }
    if let Some(nsims) = args.nsims {
        config.nsims = nsims;
    }
}

/// Runs a batch as described by `args`.
///
/// # Errors
///
/// Returns an error if logging arguments are malformed, the configuration cannot be loaded
/// or is invalid, the worker pool cannot be built, or a report cannot be written.
pub fn run_with_args(args: &BaseArgs) -> Result<BatchResult, ModelError> {
    setup_logging(args)?;

    println!("Loading configuration from: {}", args.config.display());
    let mut config = ModelConfig::from_json_file(&args.config)?;
    apply_overrides(&mut config, args);

    let mut batch = SimulationBatch::new(config)?;
    if let Some(budget) = args.time_budget {
        batch = batch.with_time_budget(budget);
    }
    #[cfg(feature = "progress_bar")]
    {
        batch = batch.with_progress_bar(args.progress);
    }

    let result = batch.execute()?;
    println!(
        "Completed {} of {} runs ({} failed, {} cancelled)",
        result.runs.len(),
        batch.config().nsims,
        result.failures.len(),
        result.cancelled.len()
    );
    for failure in &result.failures {
        warn!("run {} failed: {}", failure.run_id, failure.error);
        eprintln!("run {} failed: {}", failure.run_id, failure.error);
    }

    if let Some(output_dir) = &args.output_dir {
        for path in write_batch_reports(output_dir, &result)? {
            info!("wrote {}", path.display());
        }
    }

    log_execution_statistics(&result.statistics);
    if !args.no_stats {
        print_execution_statistics(&result.statistics);
    }
    Ok(result)
}

/// Parses the process arguments and runs the batch.
///
/// # Errors
///
/// See [`run_with_args`].
pub fn run() -> Result<BatchResult, ModelError> {
    let args = BaseArgs::parse();
    run_with_args(&args)
}
