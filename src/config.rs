//! The configuration bundle for a batch of runs, loaded from JSON.
//!
//! The layout mirrors the usual `param` / `init` / `control` split of compartmental model
//! tooling:
//!
//! ```json
//! {
//!   "type": "SEIQHRF",
//!   "nsteps": 366,
//!   "nsims": 8,
//!   "ncores": 4,
//!   "seed": 0,
//!   "statistic": "mean",
//!   "vital": true,
//!   "init": { "s.num": 9997, "i.num": 3 },
//!   "param": { "act.rate.i": 10, "inf.prob.i": [0.05, 0.05, 0.02] },
//!   "control": { "prog.rand": false, "rec.rand": false }
//! }
//! ```
//!
//! [`ModelConfig::validate`] checks the whole bundle and reports every problem at once.
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::aggregate::Statistic;
use crate::compartment::{Compartment, CompartmentCounts, Transition};
use crate::error::{ConfigIssue, ModelError};
use crate::parameters::{Param, ParameterResolver, ParameterSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    #[serde(rename = "SEIQHRF")]
    Seiqhrf,
}

/// Initial compartment sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialCounts {
    #[serde(rename = "s.num", default)]
    pub s: usize,
    #[serde(rename = "e.num", default)]
    pub e: usize,
    #[serde(rename = "i.num", default)]
    pub i: usize,
    #[serde(rename = "q.num", default)]
    pub q: usize,
    #[serde(rename = "h.num", default)]
    pub h: usize,
    #[serde(rename = "r.num", default)]
    pub r: usize,
    #[serde(rename = "f.num", default)]
    pub f: usize,
}

impl Default for InitialCounts {
    fn default() -> Self {
        Self {
            s: 9997,
            e: 0,
            i: 3,
            q: 0,
            h: 0,
            r: 0,
            f: 0,
        }
    }
}

impl From<InitialCounts> for CompartmentCounts {
    fn from(init: InitialCounts) -> Self {
        CompartmentCounts::new([init.s, init.e, init.i, init.q, init.h, init.r, init.f])
    }
}

/// Per-transition choice between a per-step Bernoulli draw (`true`) and a duration sampled
/// on compartment entry (`false`), plus the arrival and departure count modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Control {
    #[serde(rename = "prog.rand", default)]
    pub prog_rand: bool,
    #[serde(rename = "rec.rand", default)]
    pub rec_rand: bool,
    #[serde(rename = "quar.rand", default = "default_true")]
    pub quar_rand: bool,
    #[serde(rename = "hosp.rand", default = "default_true")]
    pub hosp_rand: bool,
    #[serde(rename = "disch.rand", default = "default_true")]
    pub disch_rand: bool,
    #[serde(rename = "fat.rand", default = "default_true")]
    pub fat_rand: bool,
    /// Poisson (`true`) or expected (`false`) number of arrivals
    #[serde(rename = "a.rand", default = "default_true")]
    pub a_rand: bool,
    /// Independent draws (`true`) or expected number sampled without replacement (`false`)
    #[serde(rename = "d.rand", default = "default_true")]
    pub d_rand: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Control {
    fn default() -> Self {
        Self {
            prog_rand: false,
            rec_rand: false,
            quar_rand: true,
            hosp_rand: true,
            disch_rand: true,
            fat_rand: true,
            a_rand: true,
            d_rand: true,
        }
    }
}

impl Control {
    /// Whether `transition` is drawn per step (`true`) or by sampled duration (`false`).
    #[must_use]
    pub fn is_random(&self, transition: Transition) -> bool {
        match transition {
            // Infection is always a per-contact draw.
            Transition::Infection => true,
            Transition::Progression => self.prog_rand,
            Transition::Quarantine => self.quar_rand,
            Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
                self.hosp_rand
            }
            Transition::InfectiousRecovery | Transition::QuarantinedRecovery => self.rec_rand,
            Transition::Fatality => self.fat_rand,
            Transition::Discharge => self.disch_rand,
        }
    }

    /// Sets every transition flag to `value`.
    #[must_use]
    pub fn all_random(value: bool) -> Self {
        Self {
            prog_rand: value,
            rec_rand: value,
            quar_rand: value,
            hosp_rand: value,
            disch_rand: value,
            fat_rand: value,
            ..Self::default()
        }
    }
}

/// The complete, immutable description of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(rename = "type", default)]
    pub model_type: ModelType,
    /// Number of step records per run, including the initial state
    pub nsteps: usize,
    #[serde(default = "default_nsims")]
    pub nsims: usize,
    /// Worker threads; `0` uses the available parallelism
    #[serde(default)]
    pub ncores: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub statistic: Statistic,
    /// Enables arrivals and background departures
    #[serde(default)]
    pub vital: bool,
    #[serde(default)]
    pub init: InitialCounts,
    #[serde(default)]
    pub param: ParameterSet,
    #[serde(default)]
    pub control: Control,
}

fn default_nsims() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::Seiqhrf,
            nsteps: 366,
            nsims: 1,
            ncores: 0,
            seed: 0,
            statistic: Statistic::Mean,
            vital: false,
            init: InitialCounts::default(),
            param: ParameterSet::default(),
            control: Control::default(),
        }
    }
}

/// The distribution parameters that replace a transition's rate in duration mode.
#[must_use]
pub fn duration_params(transition: Transition) -> Option<(Param, Param)> {
    match transition {
        Transition::Infection => None,
        Transition::Progression => Some((Param::ProgDistShape, Param::ProgDistScale)),
        Transition::Quarantine => Some((Param::QuarDistShape, Param::QuarDistScale)),
        Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
            Some((Param::HospDistShape, Param::HospDistScale))
        }
        Transition::InfectiousRecovery | Transition::QuarantinedRecovery => {
            Some((Param::RecDistShape, Param::RecDistScale))
        }
        Transition::Fatality => Some((Param::FatDistShape, Param::FatDistScale)),
        Transition::Discharge => Some((Param::DischDistShape, Param::DischDistScale)),
    }
}

/// The per-step rate a transition fires at in binomial mode.
#[must_use]
pub fn rate_param(transition: Transition) -> Option<Param> {
    match transition {
        // Infection and fatality have compound rates computed by the engine.
        Transition::Infection | Transition::Fatality => None,
        Transition::Progression => Some(Param::ProgRate),
        Transition::Quarantine => Some(Param::QuarRate),
        Transition::InfectiousHospitalization | Transition::QuarantinedHospitalization => {
            Some(Param::HospRate)
        }
        Transition::InfectiousRecovery | Transition::QuarantinedRecovery => Some(Param::RecRate),
        Transition::Discharge => Some(Param::DischRate),
    }
}

/// Contact rate and per-contact infection probability of an infectious compartment.
#[must_use]
pub fn contact_params(compartment: Compartment) -> Option<(Param, Param)> {
    match compartment {
        Compartment::E => Some((Param::ActRateE, Param::InfProbE)),
        Compartment::I => Some((Param::ActRateI, Param::InfProbI)),
        Compartment::Q => Some((Param::ActRateQ, Param::InfProbQ)),
        _ => None,
    }
}

/// Per-step background death probability of a compartment.
#[must_use]
pub fn departure_param(compartment: Compartment) -> Option<Param> {
    match compartment {
        Compartment::S => Some(Param::DsRate),
        Compartment::E => Some(Param::DeRate),
        Compartment::I => Some(Param::DiRate),
        Compartment::Q => Some(Param::DqRate),
        Compartment::H => Some(Param::DhRate),
        Compartment::R => Some(Param::DrRate),
        Compartment::F => None,
    }
}

impl ModelConfig {
    /// Reads a configuration from a JSON file. The result is not validated yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a well-formed configuration.
    pub fn from_json_file(path: &Path) -> Result<Self, ModelError> {
        info!("loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses a configuration from JSON text. The result is not validated yet.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a well-formed configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the whole configuration and builds the parameter resolver shared by
    /// every run.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError::Configuration`] listing every problem found.
    pub fn validate(&self) -> Result<ParameterResolver, ModelError> {
        let mut issues = Vec::new();

        if self.nsteps == 0 {
            issues.push(ConfigIssue::new("nsteps", "must be at least 1"));
        }
        if self.nsims == 0 {
            issues.push(ConfigIssue::new("nsims", "must be at least 1"));
        }
        if let Statistic::Quantile(p) = self.statistic {
            if !(0.0..=1.0).contains(&p) {
                issues.push(ConfigIssue::new(
                    "statistic",
                    format!("quantile must be within [0, 1] (got {p})"),
                ));
            }
        }

        // A zero-length run still needs a resolver to report parameter issues against.
        let resolver = match ParameterResolver::new(&self.param, self.nsteps.max(1)) {
            Ok(resolver) => Some(resolver),
            Err(ModelError::Configuration(parameter_issues)) => {
                issues.extend(parameter_issues);
                None
            }
            Err(error) => return Err(error),
        };

        if let Some(resolver) = &resolver {
            if self.vital {
                issues.extend(arrival_proportion_issues(resolver, self.nsteps));
            }
            // A distribution needs both its shape and scale; one without the other is
            // almost certainly a typo.
            for (shape, scale) in [
                (Param::QuarDistShape, Param::QuarDistScale),
                (Param::HospDistShape, Param::HospDistScale),
                (Param::DischDistShape, Param::DischDistScale),
                (Param::FatDistShape, Param::FatDistScale),
            ] {
                let has_shape = resolver.get(shape, 0).is_some();
                let has_scale = resolver.get(scale, 0).is_some();
                if has_shape != has_scale {
                    let (missing, present) = if has_shape {
                        (scale, shape)
                    } else {
                        (shape, scale)
                    };
                    issues.push(ConfigIssue::new(
                        format!("param.{}", missing.name()),
                        format!("required when param.{} is set", present.name()),
                    ));
                }
            }
        }

        match resolver {
            Some(resolver) if issues.is_empty() => {
                debug!(
                    "validated configuration: nsteps={} nsims={} population={}",
                    self.nsteps,
                    self.nsims,
                    self.initial_counts().total()
                );
                Ok(resolver)
            }
            _ => Err(ModelError::Configuration(issues)),
        }
    }

    #[must_use]
    pub fn initial_counts(&self) -> CompartmentCounts {
        self.init.into()
    }
}

fn arrival_proportion_issues(resolver: &ParameterResolver, nsteps: usize) -> Vec<ConfigIssue> {
    let varying = [Param::APropE, Param::APropI, Param::APropQ]
        .iter()
        .any(|param| resolver.is_time_varying(*param));
    let steps = if varying { nsteps } else { 1 };
    (0..steps)
        .find_map(|step| {
            let total = resolver.resolve(Param::APropE, step)
                + resolver.resolve(Param::APropI, step)
                + resolver.resolve(Param::APropQ, step);
            (total > 1.0).then(|| {
                ConfigIssue::new(
                    "param.a.prop",
                    format!(
                        "a.prop.e + a.prop.i + a.prop.q must not exceed 1 \
                         (got {total} at step {step})"
                    ),
                )
            })
        })
        .into_iter()
        .collect()
}
