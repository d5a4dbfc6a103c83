//! Stands in for the console logger when the `logging` feature is off: nothing is written,
//! but the level bookkeeping of the public API still works.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
