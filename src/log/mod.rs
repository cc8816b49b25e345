//! Logging for the projection engine. This is diagnostic output about what the engine is doing
//! (state transitions of a run, search progress, skipped corpus regions); the projection itself
//! is returned as a value and written out by the `report` module.
//!
//! The five `log` macros `error!`, `warn!`, `info!`, `debug!` and `trace!` are re-exported here.
//! Logging is _disabled_ by default and is switched on programmatically or through the
//! `--log-level` option of the `covid-projection` binary:
//!
//! ```rust
//! use covid_projection::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Report run transitions and search summaries.
//!     set_log_level(LevelFilter::Info);
//!     // Show every improvement found by the parameter search.
//!     set_module_filter("covid_projection::optimizer", LevelFilter::Trace);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use rustc_hash::FxHashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::{LazyLock, Mutex, MutexGuard};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// The matcher reports every skipped corpus region at `debug`.
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] =
    [("covid_projection::similarity", LevelFilter::Info)];

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter applied to every target that starts with `module`.
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

/// The process-wide logging state: a global level, per-module overrides, and the handle of the
/// installed logger. Only the singleton in `LOG_CONFIGURATION` exists; the public free functions
/// lock it and forward to the methods below.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for targets without a module filter. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: FxHashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .into_iter()
            .map(|(module, level)| (module.to_string(), (module, level).into()))
            .collect();
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the filter changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        if let Some(existing) = self.module_configurations.get_mut(module) {
            if existing.level == level {
                return false;
            }
            existing.level = level;
        } else {
            self.module_configurations
                .insert(module.to_string(), (module, level).into());
        }
        true
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut changed = false;
        for (module, level) in module_filters {
            changed |= self.insert_module_filter(module, *level);
        }
        if changed {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Enables all log messages. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path, e.g. `"covid_projection::runner"`.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Sets several module filters at once, rebuilding the logger only once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Removes the filter for `module_path`; the global level applies to it again.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    // A panic while holding the lock leaves the configuration itself intact.
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
