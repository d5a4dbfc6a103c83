//! CSV reports of a batch.
//!
//! | file            | one row per                     |
//! |-----------------|---------------------------------|
//! | `aggregate.csv` | step (reduced compartment counts) |
//! | `flows.csv`     | step (reduced flow counts)      |
//! | `runs.csv`      | run and step                    |
//! | `events.csv`    | run and individual              |
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use serde_derive::Serialize;

use crate::aggregate::AggregateSeries;
use crate::batch::BatchResult;
use crate::compartment::{Compartment, Transition};
use crate::error::ModelError;
use crate::run::{EventRecord, RunResult};

pub const AGGREGATE_REPORT: &str = "aggregate.csv";
pub const FLOWS_REPORT: &str = "flows.csv";
pub const RUNS_REPORT: &str = "runs.csv";
pub const EVENTS_REPORT: &str = "events.csv";

// Checks that the path is a CSV file. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, ModelError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(ModelError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn writer(path: &Path) -> Result<Writer<File>, ModelError> {
    Ok(Writer::from_writer(generate_validate_filepath(path)?))
}

/// Writes a reduced series: a `step` column followed by one column per series column.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_series(path: &Path, series: &AggregateSeries) -> Result<(), ModelError> {
    let mut writer = writer(path)?;
    let mut header = vec!["step"];
    header.extend(series.columns());
    writer.write_record(&header)?;
    for row in series.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.step.to_string());
        record.extend(row.values.iter().map(f64::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RunStepRow {
    run: usize,
    seed: u64,
    step: usize,
    #[serde(rename = "S")]
    s: usize,
    #[serde(rename = "E")]
    e: usize,
    #[serde(rename = "I")]
    i: usize,
    #[serde(rename = "Q")]
    q: usize,
    #[serde(rename = "H")]
    h: usize,
    #[serde(rename = "R")]
    r: usize,
    #[serde(rename = "F")]
    f: usize,
    se: usize,
    ei: usize,
    iq: usize,
    ih: usize,
    ir: usize,
    qh: usize,
    qr: usize,
    hf: usize,
    hr: usize,
    arrivals: usize,
    departures: usize,
}

/// Writes every step record of every run.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_runs(path: &Path, runs: &[RunResult]) -> Result<(), ModelError> {
    let mut writer = writer(path)?;
    for run in runs {
        for record in &run.steps {
            let counts = &record.counts;
            let flows = &record.flows;
            writer.serialize(RunStepRow {
                run: run.run_id,
                seed: run.seed,
                step: record.step,
                s: counts[Compartment::S],
                e: counts[Compartment::E],
                i: counts[Compartment::I],
                q: counts[Compartment::Q],
                h: counts[Compartment::H],
                r: counts[Compartment::R],
                f: counts[Compartment::F],
                se: flows[Transition::Infection],
                ei: flows[Transition::Progression],
                iq: flows[Transition::Quarantine],
                ih: flows[Transition::InfectiousHospitalization],
                ir: flows[Transition::InfectiousRecovery],
                qh: flows[Transition::QuarantinedHospitalization],
                qr: flows[Transition::QuarantinedRecovery],
                hf: flows[Transition::Fatality],
                hr: flows[Transition::Discharge],
                arrivals: record.arrivals.total(),
                departures: record.departures.total(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes the event log. Events that did not occur are empty fields.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_events<'a>(
    path: &Path,
    events: impl IntoIterator<Item = &'a EventRecord>,
) -> Result<(), ModelError> {
    let mut writer = writer(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes all four reports into `output_dir` and returns their paths.
///
/// # Errors
///
/// Returns an error if a file cannot be created or written.
pub fn write_batch_reports(
    output_dir: &Path,
    result: &BatchResult,
) -> Result<Vec<PathBuf>, ModelError> {
    let aggregate = output_dir.join(AGGREGATE_REPORT);
    let flows = output_dir.join(FLOWS_REPORT);
    let runs = output_dir.join(RUNS_REPORT);
    let events = output_dir.join(EVENTS_REPORT);

    write_series(&aggregate, &result.aggregate)?;
    write_series(&flows, &result.flows)?;
    write_runs(&runs, &result.runs)?;
    write_events(&events, result.events())?;

    info!("reports written to {}", output_dir.display());
    Ok(vec![aggregate, flows, runs, events])
}
