//! Many independent runs of one configuration on a bounded worker pool.
//!
//! Runs share the configuration and the parameter resolver read-only; each owns its
//! population and random streams. Results come back to the calling thread over a channel,
//! which is also where progress is reported, and are ordered by run id before aggregation.
use std::num::NonZeroUsize;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::aggregate::AggregateSeries;
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::execution_stats::{ExecutionProfilingCollector, ExecutionStatistics};
use crate::parameters::ParameterResolver;
use crate::random::run_seed;
pub use crate::run::CancellationToken;
use crate::run::{EventRecord, RunResult, SimulationRun};

/// A run that aborted with an error.
#[derive(Debug)]
pub struct RunFailure {
    pub run_id: usize,
    pub error: ModelError,
}

enum RunOutcome {
    Completed(RunResult),
    Failed(ModelError),
    Cancelled,
}

#[derive(Debug)]
pub struct BatchResult {
    /// Completed runs, ordered by run id
    pub runs: Vec<RunResult>,
    pub failures: Vec<RunFailure>,
    /// Runs stopped by cancellation or never started before the deadline
    pub cancelled: Vec<usize>,
    /// Compartment counts per step, reduced over the completed runs
    pub aggregate: AggregateSeries,
    /// Flow counts per step, reduced over the completed runs
    pub flows: AggregateSeries,
    pub statistics: ExecutionStatistics,
}

impl BatchResult {
    /// Whether every run completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }

    /// The event logs of all completed runs, concatenated in run order.
    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.runs.iter().flat_map(|run| run.events.iter())
    }
}

pub struct SimulationBatch {
    config: Arc<ModelConfig>,
    resolver: Arc<ParameterResolver>,
    token: CancellationToken,
    time_budget: Option<Duration>,
    #[cfg(feature = "progress_bar")]
    show_progress: bool,
    #[cfg(test)]
    failing_run: Option<usize>,
}

impl SimulationBatch {
    /// Validates `config` and prepares a batch of `config.nsims` runs.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] listing every problem with `config`.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let resolver = config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            token: CancellationToken::new(),
            time_budget: None,
            #[cfg(feature = "progress_bar")]
            show_progress: false,
            #[cfg(test)]
            failing_run: None,
        })
    }

    /// Uses `token` to stop the batch. Cancelling it stops running runs at their next step
    /// and keeps the remaining ones from starting.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Runs that have not started once `budget` has elapsed are reported as cancelled.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    #[cfg(feature = "progress_bar")]
    #[must_use]
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Makes run `run_id` abort with an accounting error at its first step.
    #[cfg(test)]
    fn with_failing_run(mut self, run_id: usize) -> Self {
        self.failing_run = Some(run_id);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The number of worker threads: `ncores`, or the available parallelism if `ncores` is
    /// zero or exceeds it.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        match self.config.ncores {
            0 => available,
            ncores => ncores.min(available),
        }
    }

    /// Executes every run and aggregates the completed ones.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PoolError`] if the worker pool cannot be built. Failures of
    /// individual runs are reported in [`BatchResult::failures`] instead.
    pub fn execute(&self) -> Result<BatchResult, ModelError> {
        let nsims = self.config.nsims;
        let workers = self.worker_count();
        let mut collector = ExecutionProfilingCollector::new();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("seiqhrf-run-{i}"))
            .build()?;
        info!("executing {nsims} runs on {workers} workers");

        #[cfg(feature = "progress_bar")]
        if self.show_progress {
            crate::progress::init_run_progress_bar(nsims);
        }

        let deadline = self.time_budget.map(|budget| Instant::now() + budget);
        let (sender, receiver) = mpsc::channel();
        for run_id in 0..nsims {
            let sender = sender.clone();
            let config = Arc::clone(&self.config);
            let resolver = Arc::clone(&self.resolver);
            let token = self.token.clone();
            #[cfg(test)]
            let failing = self.failing_run == Some(run_id);
            pool.spawn(move || {
                let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
                let outcome = if token.is_cancelled() || expired {
                    RunOutcome::Cancelled
                } else {
                    let seed = run_seed(config.seed, run_id);
                    let run = SimulationRun::new(&config, &resolver, run_id, seed);
                    #[cfg(test)]
                    let run = if failing { run.with_violation_at(1) } else { run };
                    match run.run_with_cancel(&token) {
                        Ok(Some(result)) => RunOutcome::Completed(result),
                        Ok(None) => RunOutcome::Cancelled,
                        Err(error) => RunOutcome::Failed(error),
                    }
                };
                // The receiver lives until every sender is dropped.
                let _ = sender.send((run_id, outcome));
            });
        }
        drop(sender);

        let mut runs = Vec::with_capacity(nsims);
        let mut failures = Vec::new();
        let mut cancelled = Vec::new();
        for (run_id, outcome) in receiver {
            match outcome {
                RunOutcome::Completed(result) => {
                    debug!("run {run_id} completed");
                    runs.push(result);
                }
                RunOutcome::Failed(error) => {
                    warn!("run {run_id} failed: {error}");
                    failures.push(RunFailure { run_id, error });
                }
                RunOutcome::Cancelled => cancelled.push(run_id),
            }
            collector.refresh();
            #[cfg(feature = "progress_bar")]
            if self.show_progress {
                crate::progress::increment_run_progress();
            }
        }

        #[cfg(feature = "progress_bar")]
        if self.show_progress {
            crate::progress::finish_run_progress(nsims);
        }

        runs.sort_by_key(|run| run.run_id);
        failures.sort_by_key(|failure| failure.run_id);
        cancelled.sort_unstable();
        if !cancelled.is_empty() {
            info!("{} of {nsims} runs cancelled", cancelled.len());
        }

        let statistic = self.config.statistic;
        debug!("reducing {} runs to their {}", runs.len(), statistic.label());
        let aggregate = AggregateSeries::compartments(statistic, &runs);
        let flows = AggregateSeries::flows(statistic, &runs);
        let person_steps = runs.iter().map(RunResult::person_steps).sum();
        let statistics = collector.compute_final_statistics(runs.len(), person_steps);

        Ok(BatchResult {
            runs,
            failures,
            cancelled,
            aggregate,
            flows,
            statistics,
        })
    }
}
