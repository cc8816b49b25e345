use std::fmt::{self, Debug, Display};
use std::io;

use crate::simulator::SimulationParameters;

/// The best candidate seen by a parameter search that was stopped before it
/// evaluated its whole search space.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSearch {
    pub best_params: SimulationParameters,
    pub best_error: f64,
    pub evaluated: usize,
    pub total: usize,
}

/// Provides `ProjectionError` and maps other errors to
/// convert to a `ProjectionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ProjectionError {
    /// Malformed simulation parameters or configuration values.
    InvalidParameter(String),
    /// The region series is shorter than `fitment_days + test_days`.
    InsufficientHistory { required: usize, available: usize },
    /// No candidate in the search space produced a finite error.
    NoFeasibleParameters { evaluated: usize },
    /// Non-contiguous dates or decreasing cumulative counts.
    DataGap(String),
    /// The search was stopped early; carries the best candidate found so far.
    PartialResult(Box<PartialSearch>),
    MissingStoredParameters(String),
    UnknownRegion(String),
    ReportError(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    DateError(chrono::ParseError),
    Other(String),
}

impl From<io::Error> for ProjectionError {
    fn from(error: io::Error) -> Self {
        ProjectionError::IoError(error)
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(error: serde_json::Error) -> Self {
        ProjectionError::JsonError(error)
    }
}

impl From<csv::Error> for ProjectionError {
    fn from(error: csv::Error) -> Self {
        ProjectionError::CsvError(error)
    }
}

impl From<chrono::ParseError> for ProjectionError {
    fn from(error: chrono::ParseError) -> Self {
        ProjectionError::DateError(error)
    }
}

impl From<String> for ProjectionError {
    fn from(error: String) -> Self {
        ProjectionError::Other(error)
    }
}

impl From<&str> for ProjectionError {
    fn from(error: &str) -> Self {
        ProjectionError::Other(error.to_string())
    }
}

impl std::error::Error for ProjectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectionError::IoError(error) => Some(error),
            ProjectionError::JsonError(error) => Some(error),
            ProjectionError::CsvError(error) => Some(error),
            ProjectionError::DateError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProjectionError::InvalidParameter(message) => {
                write!(f, "invalid parameter: {message}")
            }
            ProjectionError::InsufficientHistory {
                required,
                available,
            } => write!(
                f,
                "insufficient history: {required} records required, {available} available"
            ),
            ProjectionError::NoFeasibleParameters { evaluated } => write!(
                f,
                "no feasible parameters among {evaluated} evaluated candidates"
            ),
            ProjectionError::DataGap(message) => write!(f, "data gap: {message}"),
            ProjectionError::PartialResult(partial) => write!(
                f,
                "search stopped after {} of {} candidates (best error {})",
                partial.evaluated, partial.total, partial.best_error
            ),
            ProjectionError::MissingStoredParameters(region) => {
                write!(f, "no stored parameters for region {region}")
            }
            ProjectionError::UnknownRegion(region) => write!(f, "unknown region {region}"),
            ProjectionError::ReportError(message) => write!(f, "report error: {message}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_history() {
        let error = ProjectionError::InsufficientHistory {
            required: 19,
            available: 18,
        };
        assert_eq!(
            error.to_string(),
            "insufficient history: 19 records required, 18 available"
        );
    }

    #[test]
    fn string_conversion() {
        let error: ProjectionError = "boom".into();
        assert!(matches!(error, ProjectionError::Other(ref message) if message == "boom"));
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error;
        let error: ProjectionError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(error.source().is_some());
    }
}
