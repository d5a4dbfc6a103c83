//! Logging for the simulator. Not to be confused with _reporting_, which writes the model
//! outputs to CSV files.
//!
//! The crate logs through the `log` facade; this module re-exports its five macros,
//! `error!`, `warn!`, `info!`, `debug!` and `trace!`, and owns the process-wide logger
//! configuration.
//!
//! Logging is _disabled_ by default. It can be enabled from the command line with
//! `--log-level <level>` or `-v`, or programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filters are set with `set_module_filter()` / `set_module_filters()` and removed
//! with `remove_module_filter()`:
//!
//! ```rust
//! use seiqhrf::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! // Per-step trace output of the engine only.
//! set_module_filter("seiqhrf::engine", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

#[cfg(all(feature = "logging", feature = "progress_bar"))]
mod progress_bar_encoder;

use std::collections::hash_map::Entry;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::error::ModelError;
use crate::{HashMap, HashMapExt};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The level filter applied to log messages whose target starts with `module`
/// (e.g. `"seiqhrf::batch"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Tracks the filter levels of modules and holds a handle to the global logger.
///
/// Loggers are installed globally, so there is a single instance behind
/// `LOG_CONFIGURATION`; the public API are free functions that lock it.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. `LevelFilter::Off`
    /// disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::new(),
            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn set_module_filters<S: AsRef<str>>(
        &mut self,
        module_filters: &[(S, LevelFilter)],
    ) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module.as_ref(), *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes the level filter of the given module path, so the global level applies to it.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to
/// set filters in bulk.
pub fn set_module_filters<S: AsRef<str>>(module_filters: &[(S, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// A parsed `--log-level` argument: an optional global level plus per-module levels, as in
/// `info` or `seiqhrf::engine=trace,info`.
#[derive(Debug, Default, PartialEq)]
pub struct LogSpec {
    pub level: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl LogSpec {
    /// Installs the levels of this spec. A spec with only module filters enables the global
    /// level `Off` so that just the named modules log.
    pub fn apply(&self) {
        set_log_level(self.level.unwrap_or(LevelFilter::Off));
        if !self.modules.is_empty() {
            set_module_filters(&self.modules);
        }
    }
}

impl FromStr for LogSpec {
    type Err = ModelError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parse_level = |level: &str| {
            LevelFilter::from_str(level.trim())
                .map_err(|_| ModelError::ModelError(format!("invalid log level `{level}`")))
        };
        let mut parsed = LogSpec::default();
        for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((module, level)) => {
                    parsed
                        .modules
                        .push((module.trim().to_string(), parse_level(level)?));
                }
                None => parsed.level = Some(parse_level(directive)?),
            }
        }
        Ok(parsed)
    }
}
