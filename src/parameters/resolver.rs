use std::str::FromStr;

use log::trace;
use strum::{EnumCount, IntoEnumIterator};

use crate::error::{ConfigIssue, ModelError};
use crate::parameters::{Param, ParameterSet, ParameterValue};

/// A read-only, per-step lookup of every model parameter.
///
/// Built once from a [`ParameterSet`] and shared by every run of a batch. Values the
/// set does not provide fall back to [`Param::default_value`].
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    values: Vec<Option<ParameterValue>>,
}

impl ParameterResolver {
    /// Validates `set` against the known parameter names and their domains.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError::Configuration`] listing every unknown name, every empty or
    /// overlong series (longer than `nsteps`), and every value outside its domain.
    pub fn new(set: &ParameterSet, nsteps: usize) -> Result<Self, ModelError> {
        let mut values: Vec<Option<ParameterValue>> = Param::iter()
            .map(|param| param.default_value().map(ParameterValue::Scalar))
            .collect();
        let mut issues = Vec::new();

        for (name, value) in set.iter() {
            let field = format!("param.{name}");
            let Ok(param) = Param::from_str(name) else {
                issues.push(ConfigIssue::new(field, "unknown parameter"));
                continue;
            };
            if let ParameterValue::Series(series) = value {
                if series.is_empty() {
                    issues.push(ConfigIssue::new(&field, "time series must not be empty"));
                } else if series.len() > nsteps {
                    issues.push(ConfigIssue::new(
                        &field,
                        format!(
                            "time series has {} elements but nsteps is {nsteps}",
                            series.len()
                        ),
                    ));
                }
            }
            let domain = param.domain();
            if let Some((step, bad)) = value
                .values()
                .enumerate()
                .find(|(_, value)| !domain.contains(*value))
            {
                let message = match value {
                    ParameterValue::Scalar(_) => format!("{} (got {bad})", domain.describe()),
                    ParameterValue::Series(_) => {
                        format!("{} (got {bad} at step {step})", domain.describe())
                    }
                };
                issues.push(ConfigIssue::new(&field, message));
            }
            values[param.index()] = Some(value.clone());
        }

        if !issues.is_empty() {
            return Err(ModelError::Configuration(issues));
        }
        trace!("resolved {} of {} parameters from configuration", set.len(), Param::COUNT);
        Ok(Self { values })
    }

    /// The value of `param` at `step`, or `None` if it has no value.
    #[must_use]
    pub fn get(&self, param: Param, step: usize) -> Option<f64> {
        self.values[param.index()].as_ref()?.at(step)
    }

    /// The value of `param` at `step`. Parameters without a value (only the optional
    /// distribution shapes and scales) resolve to zero; use [`Self::get`] for those.
    #[must_use]
    pub fn resolve(&self, param: Param, step: usize) -> f64 {
        self.get(param, step).unwrap_or_default()
    }

    /// String-keyed variant of [`Self::get`] for collaborators that work with parameter names.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError::Configuration`] if `name` is unknown or has no value.
    pub fn resolve_named(&self, name: &str, step: usize) -> Result<f64, ModelError> {
        let param = Param::from_str(name).map_err(|_| {
            ModelError::Configuration(vec![ConfigIssue::new(
                format!("param.{name}"),
                "unknown parameter",
            )])
        })?;
        self.get(param, step).ok_or_else(|| {
            ModelError::Configuration(vec![ConfigIssue::new(
                format!("param.{name}"),
                "required but not set",
            )])
        })
    }

    /// True if `param` varies over time.
    #[must_use]
    pub fn is_time_varying(&self, param: Param) -> bool {
        matches!(
            self.values[param.index()],
            Some(ParameterValue::Series(ref series)) if series.len() > 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(pairs: &[(&str, ParameterValue)]) -> Result<ParameterResolver, ModelError> {
        let set: ParameterSet = pairs.iter().cloned().collect();
        ParameterResolver::new(&set, 10)
    }

    #[test]
    fn clamps_to_last_element() {
        let resolver =
            resolver(&[("hosp.cap", ParameterValue::Series(vec![40.0, 30.0, 20.0]))]).unwrap();
        assert_eq!(resolver.resolve(Param::HospCap, 0), 40.0);
        assert_eq!(resolver.resolve(Param::HospCap, 2), 20.0);
        assert_eq!(
            resolver.resolve(Param::HospCap, 10),
            resolver.resolve(Param::HospCap, 2)
        );
        assert!(resolver.is_time_varying(Param::HospCap));
        assert!(!resolver.is_time_varying(Param::HospRate));
    }

    #[test]
    fn scalars_are_constant() {
        let resolver = resolver(&[("quar.rate", ParameterValue::Scalar(0.25))]).unwrap();
        for step in 0..10 {
            assert_eq!(resolver.resolve(Param::QuarRate, step), 0.25);
        }
    }

    #[test]
    fn falls_back_to_defaults() {
        let resolver = resolver(&[]).unwrap();
        assert_eq!(resolver.resolve(Param::ActRateI, 3), 10.0);
        assert_eq!(resolver.get(Param::FatDistShape, 3), None);
        assert_eq!(resolver.resolve(Param::FatDistShape, 3), 0.0);
    }

    #[test]
    fn intervention_at_day_k() {
        let mut series = vec![10.0; 4];
        series.extend(vec![5.0; 6]);
        let resolver = resolver(&[("act.rate.i", ParameterValue::Series(series))]).unwrap();
        assert_eq!(resolver.resolve(Param::ActRateI, 3), 10.0);
        assert_eq!(resolver.resolve(Param::ActRateI, 4), 5.0);
        assert_eq!(resolver.resolve(Param::ActRateI, 99), 5.0);
    }

    #[test]
    fn reports_every_issue_at_once() {
        let error = resolver(&[
            ("act.rate.x", ParameterValue::Scalar(1.0)),
            ("hosp.rate", ParameterValue::Scalar(1.5)),
            ("inf.prob.i", ParameterValue::Series(vec![0.1, -0.1])),
            ("prog.dist.shape", ParameterValue::Scalar(0.0)),
            ("rec.rate", ParameterValue::Series(vec![])),
            ("quar.rate", ParameterValue::Series(vec![0.1; 11])),
        ])
        .unwrap_err();
        let issues = error.config_issues().unwrap();
        let fields: Vec<&str> = issues.iter().map(|issue| issue.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "param.act.rate.x",
                "param.hosp.rate",
                "param.inf.prob.i",
                "param.prog.dist.shape",
                "param.quar.rate",
                "param.rec.rate",
            ]
        );
        assert!(issues[2].message.contains("at step 1"));
    }

    #[test]
    fn resolve_named() {
        let resolver = resolver(&[("inf.prob.q", ParameterValue::Scalar(0.3))]).unwrap();
        assert_eq!(resolver.resolve_named("inf.prob.q", 7).unwrap(), 0.3);
        assert!(resolver.resolve_named("inf.prob.z", 7).is_err());
        assert!(resolver.resolve_named("disch.dist.scale", 7).is_err());
    }
}
