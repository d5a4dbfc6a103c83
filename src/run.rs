//! A single stochastic realization of the model.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use serde_derive::Serialize;

use crate::compartment::{CompartmentCounts, Event, FlowCounts};
use crate::config::ModelConfig;
use crate::engine::TransitionEngine;
use crate::error::ModelError;
use crate::parameters::ParameterResolver;
use crate::population::{EventTimestamps, IndividualId, Population};
use crate::random::RunRng;

/// Counts recorded at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub step: usize,
    pub counts: CompartmentCounts,
    /// Individuals moved across each edge during the step
    pub flows: FlowCounts,
    /// Arrivals by the compartment they entered
    pub arrivals: CompartmentCounts,
    /// Departures by the compartment they left
    pub departures: CompartmentCounts,
}

/// One row of the event log. `None` means the event did not occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub run: usize,
    pub individual: IndividualId,
    pub exposed: Option<usize>,
    pub infected: Option<usize>,
    pub quarantined: Option<usize>,
    pub hospitalized: Option<usize>,
    pub discharged: Option<usize>,
    pub recovered: Option<usize>,
    pub died: Option<usize>,
    pub departed: Option<usize>,
}

impl EventRecord {
    #[must_use]
    pub fn new(run: usize, individual: IndividualId, events: &EventTimestamps) -> Self {
        Self {
            run,
            individual,
            exposed: events.get(Event::Exposed),
            infected: events.get(Event::Infected),
            quarantined: events.get(Event::Quarantined),
            hospitalized: events.get(Event::Hospitalized),
            discharged: events.get(Event::Discharged),
            recovered: events.get(Event::Recovered),
            died: events.get(Event::Died),
            departed: events.get(Event::Departed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: usize,
    pub seed: u64,
    /// One record per step, starting with the initial state at step 0
    pub steps: Vec<StepRecord>,
    /// One row per individual ever created in the run
    pub events: Vec<EventRecord>,
}

impl RunResult {
    /// The sum over steps of the population size.
    #[must_use]
    pub fn person_steps(&self) -> u64 {
        self.steps
            .iter()
            .map(|record| record.counts.total() as u64)
            .sum()
    }

    #[must_use]
    pub fn final_counts(&self) -> Option<CompartmentCounts> {
        self.steps.last().map(|record| record.counts)
    }
}

/// A shared flag that stops runs at their next step boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SimulationRun<'a> {
    config: &'a ModelConfig,
    resolver: &'a ParameterResolver,
    run_id: usize,
    seed: u64,
    #[cfg(test)]
    violation_at: Option<usize>,
}

impl<'a> SimulationRun<'a> {
    /// Prepares run `run_id`. `seed` is the run's own seed, see
    /// [`run_seed`](crate::random::run_seed).
    #[must_use]
    pub fn new(
        config: &'a ModelConfig,
        resolver: &'a ParameterResolver,
        run_id: usize,
        seed: u64,
    ) -> Self {
        Self {
            config,
            resolver,
            run_id,
            seed,
            #[cfg(test)]
            violation_at: None,
        }
    }

    /// Makes the engine report an accounting error at `step`.
    #[cfg(test)]
    pub(crate) fn with_violation_at(mut self, step: usize) -> Self {
        self.violation_at = Some(step);
        self
    }

    /// Runs all `nsteps` steps.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvariantViolation`] if the population accounting diverges.
    pub fn run(&self) -> Result<RunResult, ModelError> {
        let never = CancellationToken::new();
        self.run_with_cancel(&never)?
            .ok_or_else(|| ModelError::ModelError(format!("run {} was cancelled", self.run_id)))
    }

    /// Runs all `nsteps` steps, checking `token` before each step. Returns `Ok(None)` if
    /// the run was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvariantViolation`] if the population accounting diverges.
    pub fn run_with_cancel(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<RunResult>, ModelError> {
        debug!("run {} starting (seed={})", self.run_id, self.seed);
        let engine = TransitionEngine::new(self.config, self.resolver);
        let mut rng = RunRng::new(self.seed);
        let mut population = Population::new();
        engine.initialize(&mut population, &mut rng, self.config.initial_counts());

        let mut steps = Vec::with_capacity(self.config.nsteps);
        steps.push(StepRecord {
            step: 0,
            counts: population.counts(),
            flows: FlowCounts::default(),
            arrivals: CompartmentCounts::default(),
            departures: CompartmentCounts::default(),
        });

        for step in 1..self.config.nsteps {
            if token.is_cancelled() {
                debug!("run {} cancelled before step {step}", self.run_id);
                return Ok(None);
            }
            let outcome = engine.step(&mut population, &mut rng, step);
            #[cfg(test)]
            let outcome = match self.violation_at {
                Some(at) if at == step => Err(format!("counts diverged at step {step}")),
                _ => outcome,
            };
            let record = outcome.map_err(|detail| ModelError::InvariantViolation {
                run: self.run_id,
                step,
                detail,
            })?;
            steps.push(record);
        }

        let events = population
            .iter()
            .map(|(id, individual)| EventRecord::new(self.run_id, id, individual.events()))
            .collect();
        trace!(
            "run {} finished with {} individuals created",
            self.run_id,
            population.created()
        );
        Ok(Some(RunResult {
            run_id: self.run_id,
            seed: self.seed,
            steps,
            events,
        }))
    }
}
