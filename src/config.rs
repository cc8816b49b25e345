//! Immutable configuration for a projection run. Nothing here is process-wide: a
//! `ProjectionConfig` value is built (or loaded from JSON) by the caller and passed into every
//! invocation, so concurrent runs with different settings cannot interfere.
//!
//! Every struct uses `#[serde(default)]`, so a JSON file only needs the fields it overrides:
//!
//! ```json
//! {
//!     "random_seed": 7,
//!     "search": { "strategy": { "random": { "samples": 500 } }, "time_budget": "30s" },
//!     "simulator": { "excess_policy": "defer" }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::numeric::ErrorMetric;

/// What happens to detected infections that exceed the day's testing capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcessPolicy {
    /// Untested infections are never reported.
    #[default]
    Drop,
    /// Untested infections queue up and are reported first once capacity frees up.
    Defer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Days an infection stays in the active (infectious) pool.
    pub infectious_days: usize,
    /// Fraction of true infections that would be confirmed given unlimited testing.
    pub detection_rate: f64,
    pub excess_policy: ExcessPolicy,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        SimulatorSettings {
            infectious_days: 10,
            detection_rate: 1.0,
            excess_policy: ExcessPolicy::Drop,
        }
    }
}

impl SimulatorSettings {
    /// # Errors
    /// `InvalidParameter` for a zero-length infectious period or a detection rate outside (0, 1].
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.infectious_days == 0 {
            return Err(ProjectionError::InvalidParameter(
                "infectious_days must be at least 1".to_string(),
            ));
        }
        if !(self.detection_rate > 0.0 && self.detection_rate <= 1.0) {
            return Err(ProjectionError::InvalidParameter(format!(
                "detection_rate must be in (0, 1], got {}",
                self.detection_rate
            )));
        }
        Ok(())
    }
}

/// The closed interval searched for the base transmission probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransmissionBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for TransmissionBounds {
    fn default() -> Self {
        TransmissionBounds { min: 0.01, max: 1.0 }
    }
}

impl TransmissionBounds {
    /// `steps` evenly spaced values from `min` to `max` inclusive. A single step yields `min`.
    #[must_use]
    pub fn grid(&self, steps: usize) -> Vec<f64> {
        match steps {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                #[allow(clippy::cast_precision_loss)]
                let step = (self.max - self.min) / (steps - 1) as f64;
                #[allow(clippy::cast_precision_loss)]
                (0..steps).map(|i| self.min + step * i as f64).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Every point of the Cartesian product.
    #[default]
    Grid,
    /// `samples` points drawn from the same space with a caller-supplied random source.
    Random { samples: usize },
}

/// The second-wave dimensions of the search space. A "no second wave" candidate is always
/// included alongside these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondWaveSearch {
    /// Weeks between the first and second peak.
    pub offsets_weeks: Vec<u32>,
    pub spreads: Vec<f64>,
    pub amplitude_ratios: Vec<f64>,
}

impl Default for SecondWaveSearch {
    fn default() -> Self {
        SecondWaveSearch {
            offsets_weeks: vec![4, 8, 12],
            spreads: vec![14.0],
            amplitude_ratios: vec![0.25, 0.5, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// First-wave peak weeks always searched; matched weeks are added to these.
    pub default_peak_weeks: Vec<u32>,
    /// First-wave standard deviations, in days.
    pub wave1_spreads: Vec<f64>,
    /// Number of transmission probabilities taken from the bounds.
    pub transmission_steps: usize,
    pub second_wave: Option<SecondWaveSearch>,
    pub error_metric: ErrorMetric,
    /// Candidates evaluated between two checks of the time budget.
    pub batch_size: usize,
    #[serde(with = "humantime_option")]
    pub time_budget: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            strategy: SearchStrategy::Grid,
            default_peak_weeks: (1..=12).collect(),
            wave1_spreads: vec![7.0, 14.0, 21.0, 28.0],
            transmission_steps: 50,
            second_wave: None,
            error_metric: ErrorMetric::Mape,
            batch_size: 256,
            time_budget: None,
        }
    }
}

impl SearchConfig {
    /// # Errors
    /// `InvalidParameter` if any dimension of the search space is empty or degenerate.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        let invalid = |message: &str| Err(ProjectionError::InvalidParameter(message.to_string()));
        if self.default_peak_weeks.is_empty() {
            return invalid("default_peak_weeks must not be empty");
        }
        if self.default_peak_weeks.contains(&0) {
            return invalid("default_peak_weeks must start at week 1");
        }
        if self.wave1_spreads.is_empty() {
            return invalid("wave1_spreads must not be empty");
        }
        if self.transmission_steps == 0 {
            return invalid("transmission_steps must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if let SearchStrategy::Random { samples: 0 } = self.strategy {
            return invalid("random search needs at least one sample");
        }
        if let Some(second_wave) = &self.second_wave {
            if second_wave.offsets_weeks.is_empty()
                || second_wave.spreads.is_empty()
                || second_wave.amplitude_ratios.is_empty()
            {
                return invalid("second_wave dimensions must not be empty");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Width of the trailing moving average applied to daily new cases.
    pub smoothing_days: usize,
    /// Number of candidate windows returned.
    pub top_k: usize,
    /// Historical regions whose smoothed peak is below this are ignored.
    pub min_peak_cases: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            smoothing_days: 7,
            top_k: 5,
            min_peak_cases: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub simulator: SimulatorSettings,
    pub search: SearchConfig,
    pub matcher: MatcherConfig,
    pub transmission_bounds: TransmissionBounds,
    pub random_seed: u64,
}

impl ProjectionConfig {
    /// Reads a (possibly partial) configuration from a JSON file and validates it.
    ///
    /// # Errors
    /// I/O and JSON errors, or `InvalidParameter` from [`ProjectionConfig::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self, ProjectionError> {
        let reader = BufReader::new(File::open(path)?);
        let config: ProjectionConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `InvalidParameter` describing the first offending value.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        self.simulator.validate()?;
        self.search.validate()?;
        let bounds = self.transmission_bounds;
        if !(bounds.min > 0.0 && bounds.min <= bounds.max && bounds.max.is_finite()) {
            return Err(ProjectionError::InvalidParameter(format!(
                "transmission bounds must satisfy 0 < min <= max, got [{}, {}]",
                bounds.min, bounds.max
            )));
        }
        if self.matcher.smoothing_days == 0 {
            return Err(ProjectionError::InvalidParameter(
                "smoothing_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// (De)serializes `Option<Duration>` as a human readable string such as `"1m 30s"`.
mod humantime_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                serializer.serialize_str(&humantime::format_duration(*duration).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
