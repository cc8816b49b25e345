//! Writes projection results out and persists learned parameters between runs.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::data::ParameterStore;
use crate::error::ProjectionError;
use crate::log::{debug, trace};
use crate::runner::ProjectionResult;
use crate::simulator::SimulationParameters;

/// One row of the projection report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub day: usize,
    pub date: String,
    pub projected_new_cases: f64,
    pub cumulative: f64,
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, ProjectionError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(ProjectionError::ReportError(
            "Report output files must be CSVs".to_string(),
        )),
    }
}

/// The report rows of `result`, cumulative counts starting from the confirmed count on the day
/// before the projection.
#[must_use]
pub fn projection_rows(result: &ProjectionResult) -> Vec<ProjectionRow> {
    #[allow(clippy::cast_precision_loss)]
    let cumulative = result.cumulative_projection(result.confirmed_at_start as f64);
    result
        .daily_projected_cases
        .iter()
        .zip(cumulative)
        .enumerate()
        .map(|(day, (cases, total))| ProjectionRow {
            day,
            date: result
                .date_of(day)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            projected_new_cases: *cases,
            cumulative: total,
        })
        .collect()
}

/// Writes `day,date,projected_new_cases,cumulative` rows for `result` to `path`.
///
/// # Errors
/// `ReportError` if `path` is not a `.csv` file, plus I/O and CSV errors.
pub fn write_projection_csv(result: &ProjectionResult, path: &Path) -> Result<(), ProjectionError> {
    let file = generate_validate_filepath(path)?;
    let mut writer = Writer::from_writer(file);
    for row in projection_rows(result) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!("wrote {} projection rows to {}", result.daily_projected_cases.len(), path.display());
    Ok(())
}

/// Keeps the last learned parameters of each region in `<dir>/<region>.json`.
#[derive(Debug, Clone)]
pub struct JsonParameterStore {
    directory: PathBuf,
}

impl JsonParameterStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        JsonParameterStore {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn path_for(&self, region: &str) -> PathBuf {
        self.directory.join(format!("{region}.json"))
    }
}

impl ParameterStore for JsonParameterStore {
    fn load_last_params(
        &self,
        region: &str,
    ) -> Result<Option<SimulationParameters>, ProjectionError> {
        let path = self.path_for(region);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let params = serde_json::from_reader(BufReader::new(file))?;
        trace!("loaded parameters for {region} from {}", path.display());
        Ok(Some(params))
    }

    fn save_params(
        &self,
        region: &str,
        params: &SimulationParameters,
    ) -> Result<(), ProjectionError> {
        create_dir_all(&self.directory)?;
        let path = self.path_for(region);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), params)?;
        debug!("saved parameters for {region} to {}", path.display());
        Ok(())
    }
}
