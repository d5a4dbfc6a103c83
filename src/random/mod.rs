//! Seeded random number streams for a single run.
//!
//! Each run owns one independent generator per [`RngStream`]. Every stream is seeded from
//! the run seed plus a hash of the stream's name, so, for example, enabling vital dynamics
//! does not perturb the draws that decide infections. Streams are created lazily the first
//! time they are used.
mod sampling_algorithms;

use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use strum::{EnumCount, EnumIter, IntoStaticStr};

pub use sampling_algorithms::sample_multiple_from_known_length;

use crate::hashing::hash_str;

/// The purpose a random draw serves. Each purpose has its own generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum RngStream {
    Infection,
    Progression,
    Quarantine,
    Hospitalization,
    Recovery,
    Fatality,
    Discharge,
    VitalDynamics,
}

impl RngStream {
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Derives the seed of run `run_id` from the batch seed.
#[must_use]
pub fn run_seed(base_seed: u64, run_id: usize) -> u64 {
    base_seed.wrapping_add(hash_str(&format!("run-{run_id}")))
}

/// The generators of one run.
pub struct RunRng {
    base_seed: u64,
    streams: [Option<SmallRng>; RngStream::COUNT],
}

impl RunRng {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            streams: Default::default(),
        }
    }

    /// Gets the generator for `stream`, creating it on first use.
    pub fn get_rng(&mut self, stream: RngStream) -> &mut SmallRng {
        let base_seed = self.base_seed;
        self.streams[stream as usize].get_or_insert_with(|| {
            trace!(
                "creating new RNG (seed={}) for stream {}",
                base_seed,
                stream.name()
            );
            SmallRng::seed_from_u64(base_seed.wrapping_add(hash_str(stream.name())))
        })
    }

    /// Applies `sampler` to the generator of `stream`.
    pub fn sample<T>(&mut self, stream: RngStream, sampler: impl FnOnce(&mut SmallRng) -> T) -> T {
        sampler(self.get_rng(stream))
    }

    /// Draws one value from `distribution` using the generator of `stream`.
    pub fn sample_distr<T>(&mut self, stream: RngStream, distribution: impl Distribution<T>) -> T {
        distribution.sample(self.get_rng(stream))
    }

    /// Draws uniformly from `range` using the generator of `stream`.
    pub fn sample_range<S, T>(&mut self, stream: RngStream, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.get_rng(stream).random_range(range)
    }

    /// Returns `true` with probability `p`. Values of `p` outside `[0, 1]` are clamped, and a
    /// probability of exactly zero or one consumes no randomness.
    pub fn sample_bool(&mut self, stream: RngStream, p: f64) -> bool {
        if p.is_nan() || p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.get_rng(stream).random_bool(p)
        }
    }

    /// Draws an index into `weights`, each index chosen proportionally to its weight.
    /// Returns `None` if no weight is positive.
    pub fn sample_weighted(&mut self, stream: RngStream, weights: &[f64]) -> Option<usize> {
        let index = WeightedIndex::new(weights).ok()?;
        Some(index.sample(self.get_rng(stream)))
    }
}
