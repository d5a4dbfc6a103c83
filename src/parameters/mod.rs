//! Model parameters: their names, defaults, valid domains, and per-step resolution.
//!
//! Every parameter is either a scalar or a time series. A time series is read at the
//! step being computed and clamps to its last element, so an intervention on day `k` is
//! written as `k` copies of the old value followed by the new one:
//!
//! ```
//! use seiqhrf::parameters::{Param, ParameterResolver, ParameterSet, ParameterValue};
//!
//! let mut set = ParameterSet::default();
//! set.insert("act.rate.i", ParameterValue::Series(vec![10.0, 10.0, 5.0]));
//! let resolver = ParameterResolver::new(&set, 100).unwrap();
//! assert_eq!(resolver.resolve(Param::ActRateI, 1), 10.0);
//! assert_eq!(resolver.resolve(Param::ActRateI, 50), 5.0);
//! ```
mod resolver;

use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, EnumString, IntoStaticStr};

pub use resolver::ParameterResolver;

/// A parameter value as it appears in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl ParameterValue {
    /// The value at `step`, clamping to the last element of a series. An empty series has
    /// no value.
    #[must_use]
    pub fn at(&self, step: usize) -> Option<f64> {
        match self {
            ParameterValue::Scalar(value) => Some(*value),
            ParameterValue::Series(values) => {
                let last = values.len().checked_sub(1)?;
                values.get(step.min(last)).copied()
            }
        }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        let slice = match self {
            ParameterValue::Scalar(value) => std::slice::from_ref(value),
            ParameterValue::Series(values) => values.as_slice(),
        };
        slice.iter().copied()
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(values: Vec<f64>) -> Self {
        ParameterValue::Series(values)
    }
}

/// Named parameter values, keyed by their dotted names (`act.rate.i`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParameterValue>);

impl ParameterSet {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, V: Into<ParameterValue>> FromIterator<(S, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// The set of values a parameter may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// A per-step probability in `[0, 1]`
    Probability,
    /// Any finite value `>= 0`
    NonNegative,
    /// Any finite value `> 0`
    Positive,
}

impl Domain {
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Domain::Probability => (0.0..=1.0).contains(&value),
                Domain::NonNegative => value >= 0.0,
                Domain::Positive => value > 0.0,
            }
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Domain::Probability => "must be within [0, 1]",
            Domain::NonNegative => "must be finite and non-negative",
            Domain::Positive => "must be finite and positive",
        }
    }
}

const BACKGROUND_DEATH_RATE: f64 = 7.0 / 365.0 / 1000.0;

/// Every parameter the model reads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, EnumString, IntoStaticStr,
)]
pub enum Param {
    #[strum(serialize = "act.rate.e")]
    ActRateE,
    #[strum(serialize = "inf.prob.e")]
    InfProbE,
    #[strum(serialize = "act.rate.i")]
    ActRateI,
    #[strum(serialize = "inf.prob.i")]
    InfProbI,
    #[strum(serialize = "act.rate.q")]
    ActRateQ,
    #[strum(serialize = "inf.prob.q")]
    InfProbQ,
    #[strum(serialize = "quar.rate")]
    QuarRate,
    #[strum(serialize = "quar.dist.shape")]
    QuarDistShape,
    #[strum(serialize = "quar.dist.scale")]
    QuarDistScale,
    #[strum(serialize = "hosp.rate")]
    HospRate,
    #[strum(serialize = "hosp.dist.shape")]
    HospDistShape,
    #[strum(serialize = "hosp.dist.scale")]
    HospDistScale,
    #[strum(serialize = "disch.rate")]
    DischRate,
    #[strum(serialize = "disch.dist.shape")]
    DischDistShape,
    #[strum(serialize = "disch.dist.scale")]
    DischDistScale,
    #[strum(serialize = "prog.rate")]
    ProgRate,
    #[strum(serialize = "prog.dist.shape")]
    ProgDistShape,
    #[strum(serialize = "prog.dist.scale")]
    ProgDistScale,
    #[strum(serialize = "rec.rate")]
    RecRate,
    #[strum(serialize = "rec.dist.shape")]
    RecDistShape,
    #[strum(serialize = "rec.dist.scale")]
    RecDistScale,
    #[strum(serialize = "fat.rate.base")]
    FatRateBase,
    #[strum(serialize = "fat.rate.overcap")]
    FatRateOvercap,
    #[strum(serialize = "fat.tcoeff")]
    FatTcoeff,
    #[strum(serialize = "fat.dist.shape")]
    FatDistShape,
    #[strum(serialize = "fat.dist.scale")]
    FatDistScale,
    #[strum(serialize = "hosp.cap")]
    HospCap,
    #[strum(serialize = "a.rate")]
    ARate,
    #[strum(serialize = "a.prop.e")]
    APropE,
    #[strum(serialize = "a.prop.i")]
    APropI,
    #[strum(serialize = "a.prop.q")]
    APropQ,
    #[strum(serialize = "ds.rate")]
    DsRate,
    #[strum(serialize = "de.rate")]
    DeRate,
    #[strum(serialize = "di.rate")]
    DiRate,
    #[strum(serialize = "dq.rate")]
    DqRate,
    #[strum(serialize = "dh.rate")]
    DhRate,
    #[strum(serialize = "dr.rate")]
    DrRate,
}

impl Param {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The value used when a configuration does not set the parameter. Distribution
    /// shapes and scales other than those of progression and recovery have no default.
    #[must_use]
    pub fn default_value(self) -> Option<f64> {
        let value = match self {
            Param::ActRateE | Param::InfProbE => 0.0,
            Param::ActRateI => 10.0,
            Param::InfProbI => 0.05,
            Param::ActRateQ => 2.5,
            Param::InfProbQ => 0.02,
            Param::QuarRate => 1.0 / 30.0,
            Param::HospRate => 1.0 / 100.0,
            Param::DischRate => 1.0 / 15.0,
            Param::ProgRate => 1.0 / 10.0,
            Param::ProgDistShape | Param::RecDistShape => 1.5,
            Param::ProgDistScale => 5.0,
            Param::RecRate => 1.0 / 20.0,
            Param::RecDistScale => 35.0,
            Param::FatRateBase => 1.0 / 50.0,
            Param::FatRateOvercap => 1.0 / 25.0,
            Param::FatTcoeff => 0.5,
            Param::HospCap => 40.0,
            Param::ARate => 10.5 / 365.0 / 1000.0,
            Param::APropE | Param::APropQ => 0.01,
            Param::APropI => 0.001,
            Param::DsRate | Param::DeRate | Param::DrRate => BACKGROUND_DEATH_RATE,
            Param::DiRate | Param::DqRate => BACKGROUND_DEATH_RATE * 1.1,
            Param::DhRate => BACKGROUND_DEATH_RATE * 1.2,
            Param::QuarDistShape
            | Param::QuarDistScale
            | Param::HospDistShape
            | Param::HospDistScale
            | Param::DischDistShape
            | Param::DischDistScale
            | Param::FatDistShape
            | Param::FatDistScale => return None,
        };
        Some(value)
    }

    #[must_use]
    pub fn domain(self) -> Domain {
        match self {
            Param::ActRateE | Param::ActRateI | Param::ActRateQ | Param::HospCap | Param::ARate => {
                Domain::NonNegative
            }
            Param::QuarDistShape
            | Param::QuarDistScale
            | Param::HospDistShape
            | Param::HospDistScale
            | Param::DischDistShape
            | Param::DischDistScale
            | Param::ProgDistShape
            | Param::ProgDistScale
            | Param::RecDistShape
            | Param::RecDistScale
            | Param::FatDistShape
            | Param::FatDistScale => Domain::Positive,
            _ => Domain::Probability,
        }
    }
}
