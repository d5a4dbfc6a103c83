//! Error types for configuring and running simulations.
//!
//! There are two model-level failure modes. A [`ModelError::Configuration`] is
//! raised before any run starts and carries every problem found in the
//! configuration at once, so a caller can fix them all in one pass. A
//! [`ModelError::InvariantViolation`] means the population accounting of a run
//! diverged; it aborts that run only. A transition that simply does not fire
//! is never an error.
use std::fmt::{self, Debug, Display};
use std::io;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    /// The offending field, e.g. `param.act.rate.i` or `nsteps`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Provides `ModelError` and maps other errors to it
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ModelError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// The configuration is invalid; every issue found is listed.
    Configuration(Vec<ConfigIssue>),
    /// Population accounting diverged during a run.
    InvariantViolation {
        run: usize,
        step: usize,
        detail: String,
    },
    /// The worker pool could not be built.
    PoolError(String),
    ReportError(String),
    ModelError(String),
}

impl ModelError {
    /// Returns the configuration issues if this is a configuration error.
    #[must_use]
    pub fn config_issues(&self) -> Option<&[ConfigIssue]> {
        match self {
            ModelError::Configuration(issues) => Some(issues),
            _ => None,
        }
    }
}

impl From<io::Error> for ModelError {
    fn from(error: io::Error) -> Self {
        ModelError::IoError(error)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(error: serde_json::Error) -> Self {
        ModelError::JsonError(error)
    }
}

impl From<csv::Error> for ModelError {
    fn from(error: csv::Error) -> Self {
        ModelError::CSVError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for ModelError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        ModelError::PoolError(error.to_string())
    }
}

impl From<Vec<ConfigIssue>> for ModelError {
    fn from(issues: Vec<ConfigIssue>) -> Self {
        ModelError::Configuration(issues)
    }
}

impl From<String> for ModelError {
    fn from(error: String) -> Self {
        ModelError::ModelError(error)
    }
}

impl From<&str> for ModelError {
    fn from(error: &str) -> Self {
        ModelError::ModelError(error.to_string())
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::IoError(error) => Some(error),
            ModelError::JsonError(error) => Some(error),
            ModelError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::Configuration(issues) => {
                write!(f, "invalid configuration ({} issues)", issues.len())?;
                for issue in issues {
                    write!(f, "\n  {issue}")?;
                }
                Ok(())
            }
            ModelError::InvariantViolation { run, step, detail } => {
                write!(f, "invariant violated in run {run} at step {step}: {detail}")
            }
            ModelError::IoError(error) => write!(f, "I/O error: {error}"),
            ModelError::JsonError(error) => write!(f, "JSON error: {error}"),
            ModelError::CSVError(error) => write!(f, "CSV error: {error}"),
            ModelError::PoolError(message) => write!(f, "worker pool error: {message}"),
            ModelError::ReportError(message) => write!(f, "report error: {message}"),
            ModelError::ModelError(message) => write!(f, "Error: {message}"),
        }
    }
}
