//! The two ways a transition can decide to fire.
//!
//! * [`DrawPolicy::Binomial`]: every step, each eligible individual fires independently
//!   with the resolved per-step probability. No time-step correction is applied; the rate
//!   is read as a Bernoulli probability.
//! * [`DrawPolicy::Duration`]: when an individual enters the source compartment a
//!   residence time is sampled once from a Gamma distribution truncated at zero, and the
//!   transition fires on the first step at which the time spent in the compartment reaches
//!   it.
//!
//! Fatality additionally uses a rate that depends on hospital occupancy, see
//! [`effective_fatality_rate`].
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::random::{RngStream, RunRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPolicy {
    Binomial,
    Duration,
}

impl DrawPolicy {
    /// Maps a `*.rand` control flag to its policy.
    #[must_use]
    pub fn from_flag(rand: bool) -> Self {
        if rand {
            DrawPolicy::Binomial
        } else {
            DrawPolicy::Duration
        }
    }

    /// Decides whether an individual fires this step.
    ///
    /// `rate` is only read in binomial mode and `elapsed` / `duration` only in duration
    /// mode. `elapsed` is the number of steps since the individual entered the source
    /// compartment and `duration` the value sampled on entry.
    pub fn fires(
        self,
        rng: &mut RunRng,
        stream: RngStream,
        rate: f64,
        elapsed: usize,
        duration: f64,
    ) -> bool {
        match self {
            DrawPolicy::Binomial => rng.sample_bool(stream, rate),
            DrawPolicy::Duration => elapsed as f64 >= duration,
        }
    }
}

/// The distribution a residence time is sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationDistribution {
    Gamma { shape: f64, scale: f64 },
    /// The transition never fires, e.g. because its rate is zero.
    Never,
}

impl DurationDistribution {
    #[must_use]
    pub fn gamma(shape: f64, scale: f64) -> Self {
        DurationDistribution::Gamma { shape, scale }
    }

    /// An exponential distribution with mean `1 / rate`.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            DurationDistribution::Gamma {
                shape: 1.0,
                scale: 1.0 / rate,
            }
        } else {
            DurationDistribution::Never
        }
    }

    /// Samples a residence time. Negative or undefined samples, including those from a
    /// distribution with a non-positive shape or scale, are truncated to zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            DurationDistribution::Never => f64::INFINITY,
            DurationDistribution::Gamma { shape, scale } => match Gamma::new(shape, scale) {
                Ok(gamma) => {
                    let value: f64 = gamma.sample(rng);
                    if value.is_nan() || value < 0.0 {
                        0.0
                    } else {
                        value
                    }
                }
                Err(error) => {
                    debug!(
                        "degenerate duration distribution (shape={shape}, scale={scale}): \
                         {error}; truncating to 0"
                    );
                    0.0
                }
            },
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            DurationDistribution::Never => f64::INFINITY,
            DurationDistribution::Gamma { shape, scale } => (shape * scale).max(0.0),
        }
    }
}

/// The per-step fatality probability of a hospitalized individual.
///
/// With `occupancy <= capacity` every patient dies with `base`. Above capacity, the
/// patients within capacity keep `base` and the excess ones get
/// `tcoeff * overcap + (1 - tcoeff) * base`; the result is the occupancy-weighted average
/// of the two, so it tends to the blended rate as occupancy grows.
#[must_use]
pub fn effective_fatality_rate(
    occupancy: usize,
    capacity: f64,
    base: f64,
    overcap: f64,
    tcoeff: f64,
) -> f64 {
    let occupancy = occupancy as f64;
    if occupancy <= capacity {
        return base;
    }
    let capacity = capacity.max(0.0);
    let blended = tcoeff * overcap + (1.0 - tcoeff) * base;
    (capacity * base + (occupancy - capacity) * blended) / occupancy
}
