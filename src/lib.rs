//! An individual-based stochastic simulator for SEIQHRF epidemics
//!
//! The model follows every member of a population through seven mutually
//! exclusive compartments: Susceptible, Exposed, Infectious, Quarantined,
//! requiring Hospitalization, Recovered and Fatality. Time advances in
//! discrete steps. At each step every individual is evaluated against the
//! state of the population at the end of the previous step, so the order in
//! which individuals are visited never matters.
//!
//! The building blocks, leaves first:
//! * [`parameters`] resolves scalar or time-varying parameters at a step,
//!   which is how interventions ("halve the contact rate from day 30") are
//!   expressed.
//! * [`draw_policy`] decides whether an individual fires a transition, either
//!   by a per-step Bernoulli draw or by comparing time spent in the
//!   compartment with a duration sampled on entry.
//! * [`population`] is an arena of individuals with one index set per
//!   compartment.
//! * [`engine`] applies one step: infection, progression, quarantine,
//!   hospitalization, capacity-dependent fatality, recovery and (optionally)
//!   births and background deaths.
//! * [`run`] drives the engine for a number of steps and records counts,
//!   flows and per-individual event timestamps.
//! * [`batch`] executes many independent runs on a worker pool and reduces
//!   them to a mean, median or quantile trajectory.
//!
//! A minimal batch:
//!
//! ```no_run
//! use seiqhrf::prelude::*;
//!
//! let config = ModelConfig::from_json_file("baseline.json".as_ref()).unwrap();
//! let result = SimulationBatch::new(config).unwrap().execute().unwrap();
//! for row in result.aggregate.rows() {
//!     println!("{} {:?}", row.step, row.values);
//! }
//! ```
pub mod aggregate;
pub mod batch;
pub mod compartment;
pub mod config;
pub mod draw_policy;
pub mod engine;
pub mod error;
pub mod execution_stats;
pub mod hashing;
pub mod log;
pub mod parameters;
pub mod population;
#[cfg(feature = "progress_bar")]
pub mod progress;
pub mod random;
pub mod report;
pub mod run;
pub mod runner;

pub mod prelude;

pub use error::ModelError;
pub use crate::log::{debug, error, info, trace, warn};
pub use hashing::{HashMap, HashMapExt, HashSet};

// Re-exports of the dependencies that appear in this crate's public API.
pub use rand;
pub use rand_distr;
