//! Reduction of per-run step records into one series per batch.
//!
//! For every step and column the values of all successful runs are reduced with a
//! [`Statistic`]. Means are computed from exact integer sums and order statistics from
//! sorted values, so the result does not depend on the order in which runs finished.
use serde_derive::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, Transition};
use crate::run::{RunResult, StepRecord};

/// How the values of a step are reduced across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Median,
    /// The `p`-quantile, interpolating linearly between order statistics.
    Quantile(f64),
}

impl Statistic {
    /// Reduces `values`, reordering them in place. Returns `None` for an empty slice.
    pub fn reduce(self, values: &mut [usize]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self {
            Statistic::Mean => {
                let sum: u128 = values.iter().map(|value| *value as u128).sum();
                Some(sum as f64 / values.len() as f64)
            }
            Statistic::Median => Some(quantile(values, 0.5)),
            Statistic::Quantile(p) => Some(quantile(values, p)),
        }
    }

    /// A short label, e.g. for report headers.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Statistic::Mean => "mean".to_string(),
            Statistic::Median => "median".to_string(),
            Statistic::Quantile(p) => format!("q{p}"),
        }
    }
}

/// The `p`-quantile of `values` (sorted in place), `h = (n - 1) p` between the
/// neighbouring order statistics.
fn quantile(values: &mut [usize], p: f64) -> f64 {
    values.sort_unstable();
    let position = (values.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    let low = values[lower] as f64;
    let high = values[upper] as f64;
    low + (high - low) * fraction
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub step: usize,
    pub values: Vec<f64>,
}

/// A reduced series: one row per step, one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSeries {
    statistic: Statistic,
    columns: Vec<&'static str>,
    rows: Vec<AggregateRow>,
}

impl AggregateSeries {
    /// Reduces a column per compartment, in `S, E, I, Q, H, R, F` order.
    #[must_use]
    pub fn compartments(statistic: Statistic, runs: &[RunResult]) -> Self {
        Self::reduce(
            statistic,
            Compartment::iter().map(<&'static str>::from).collect(),
            runs,
            |record, column| record.counts.as_array()[column],
        )
    }

    /// Reduces a column per transition edge.
    #[must_use]
    pub fn flows(statistic: Statistic, runs: &[RunResult]) -> Self {
        let transitions: Vec<Transition> = Transition::iter().collect();
        Self::reduce(
            statistic,
            transitions.iter().map(|transition| (*transition).into()).collect(),
            runs,
            |record, column| record.flows[transitions[column]],
        )
    }

    fn reduce(
        statistic: Statistic,
        columns: Vec<&'static str>,
        runs: &[RunResult],
        value: impl Fn(&StepRecord, usize) -> usize,
    ) -> Self {
        let nsteps = runs.iter().map(|run| run.steps.len()).min().unwrap_or(0);
        let mut scratch = Vec::with_capacity(runs.len());
        let mut rows = Vec::with_capacity(nsteps);
        for step in 0..nsteps {
            let mut values = Vec::with_capacity(columns.len());
            for column in 0..columns.len() {
                scratch.clear();
                scratch.extend(runs.iter().map(|run| value(&run.steps[step], column)));
                values.push(statistic.reduce(&mut scratch).unwrap_or(f64::NAN));
            }
            rows.push(AggregateRow { step, values });
        }
        Self {
            statistic,
            columns,
            rows,
        }
    }

    #[must_use]
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    #[must_use]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value of `column` at `step`.
    #[must_use]
    pub fn get(&self, step: usize, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|name| *name == column)?;
        Some(self.rows.get(step)?.values[index])
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::compartment::{CompartmentCounts, FlowCounts};

    fn run(run_id: usize, s: &[usize]) -> RunResult {
        let steps = s
            .iter()
            .enumerate()
            .map(|(step, &s)| StepRecord {
                step,
                counts: CompartmentCounts::new([s, 0, 10 - s, 0, 0, 0, 0]),
                flows: FlowCounts::default(),
                arrivals: CompartmentCounts::default(),
                departures: CompartmentCounts::default(),
            })
            .collect();
        RunResult {
            run_id,
            seed: 0,
            steps,
            events: Vec::new(),
        }
    }

    #[test]
    fn mean_median_quantile() {
        let mut values = [4, 1, 3, 2];
        assert_eq!(Statistic::Mean.reduce(&mut values), Some(2.5));
        assert_eq!(Statistic::Median.reduce(&mut values), Some(2.5));
        assert_eq!(Statistic::Quantile(0.0).reduce(&mut values), Some(1.0));
        assert_eq!(Statistic::Quantile(1.0).reduce(&mut values), Some(4.0));
        assert_relative_eq!(Statistic::Quantile(0.9).reduce(&mut values).unwrap(), 3.7);
        assert_eq!(Statistic::Median.reduce(&mut [7]), Some(7.0));
        assert_eq!(Statistic::Mean.reduce(&mut []), None);
    }

    #[test]
    fn statistic_serde() {
        let parse = |json: &str| serde_json::from_str::<Statistic>(json).unwrap();
        assert_eq!(parse(r#""mean""#), Statistic::Mean);
        assert_eq!(parse(r#""median""#), Statistic::Median);
        assert_eq!(parse(r#"{"quantile": 0.25}"#), Statistic::Quantile(0.25));
        assert_eq!(Statistic::Quantile(0.25).label(), "q0.25");
    }

    #[test]
    fn series_per_step() {
        let runs = vec![run(0, &[10, 8, 5]), run(1, &[10, 6, 2]), run(2, &[10, 9, 9])];
        let series = AggregateSeries::compartments(Statistic::Median, &runs);
        assert_eq!(series.columns(), &["S", "E", "I", "Q", "H", "R", "F"]);
        assert_eq!(series.rows().len(), 3);
        assert_eq!(series.get(1, "S"), Some(8.0));
        assert_eq!(series.get(2, "I"), Some(5.0));
        assert_eq!(series.rows()[0].step, 0);
        assert_eq!(series.get(3, "S"), None);
    }

    #[test]
    fn order_invariant() {
        let runs = vec![
            run(0, &[10, 7, 3]),
            run(1, &[10, 1, 0]),
            run(2, &[10, 9, 8]),
            run(3, &[10, 4, 4]),
        ];
        let mut reversed = runs.clone();
        reversed.reverse();
        let mut rotated = runs.clone();
        rotated.rotate_left(1);
        for statistic in [Statistic::Mean, Statistic::Median, Statistic::Quantile(0.3)] {
            let expected = AggregateSeries::compartments(statistic, &runs);
            assert_eq!(AggregateSeries::compartments(statistic, &reversed), expected);
            assert_eq!(AggregateSeries::compartments(statistic, &rotated), expected);
        }
    }

    #[test]
    fn no_runs_no_rows() {
        let series = AggregateSeries::flows(Statistic::Mean, &[]);
        assert!(series.is_empty());
        assert_eq!(series.columns().len(), 9);
        assert_eq!(series.columns()[0], "se");
    }
}
