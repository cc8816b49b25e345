//! Used when the `logging` feature is disabled: nothing is printed, but the `log` max level
//! still follows the configuration so disabled messages cost nothing.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
