//! The `log4rs` console backend. Records from worker threads and from the calling thread
//! share one stdout appender; per-module levels become `log4rs` loggers.
use log4rs::append::console::ConsoleAppender;
use log4rs::config::runtime::ConfigErrors;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::Encode;
use log4rs::Config;

#[cfg(feature = "progress_bar")]
use super::progress_bar_encoder::PBWrapperEncoder;
use crate::log::{LogConfiguration, ModuleLogConfiguration};

const APPENDER: &str = "stdout";

// ISO 8601 timestamp, color coded level tag, target
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl From<&ModuleLogConfiguration> for Logger {
    fn from(module_config: &ModuleLogConfiguration) -> Self {
        Logger::builder().build(module_config.module.clone(), module_config.level)
    }
}

fn encoder() -> Box<dyn Encode> {
    let encoder = Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN));
    #[cfg(feature = "progress_bar")]
    let encoder = Box::new(PBWrapperEncoder::new(encoder));
    encoder
}

impl LogConfiguration {
    /// The `log4rs` configuration equivalent to this [`LogConfiguration`].
    fn build_config(&self) -> Result<Config, ConfigErrors> {
        let console = ConsoleAppender::builder().encoder(encoder()).build();
        let loggers = self.module_configurations.values().map(Logger::from);
        Config::builder()
            .appender(Appender::builder().build(APPENDER, Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender(APPENDER).build(self.global_log_level))
    }

    /// Installs this configuration as the global logger, or swaps it into the logger
    /// installed earlier. Failures are reported on stderr and leave logging unchanged.
    pub(in crate::log) fn set_config(&mut self) {
        let config = match self.build_config() {
            Ok(config) => config,
            Err(error) => {
                eprintln!("failed to build logging configuration: {error}");
                return;
            }
        };
        match self.root_handle {
            Some(ref handle) => handle.set_config(config),
            None => match log4rs::init_config(config) {
                Ok(handle) => self.root_handle = Some(handle),
                Err(error) => eprintln!("failed to install logger: {error}"),
            },
        }
    }
}
