//! Region time series and the interfaces of the collaborators that supply them.
//!
//! The engine never fetches data itself. A `RegionDataProvider`, `InterventionDataProvider`,
//! `HistoricalCorpusProvider` and `ParameterStore` hand it already-materialized values; the
//! in-memory implementations here back tests and the CSV-driven binary.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::log::debug;
use crate::simulator::SimulationParameters;

/// One region-day. Cumulative fields are running totals since the start of the epidemic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub confirmed: u64,
    /// Derived by [`RegionTimeSeries::new`]; any incoming value is overwritten.
    #[serde(default)]
    pub new_cases: u64,
    #[serde(default)]
    pub recovered: u64,
    #[serde(default)]
    pub deceased: u64,
    pub population: u64,
    /// Stringency in `[0, 1]`, if known for this day.
    #[serde(default)]
    pub intervention_score: Option<f64>,
}

impl DailyRecord {
    #[must_use]
    pub fn new(date: NaiveDate, confirmed: u64, population: u64) -> Self {
        DailyRecord {
            date,
            confirmed,
            new_cases: 0,
            recovered: 0,
            deceased: 0,
            population,
            intervention_score: None,
        }
    }

    /// `confirmed - recovered - deceased`, floored at zero.
    #[must_use]
    pub fn active(&self) -> u64 {
        self.confirmed
            .saturating_sub(self.recovered)
            .saturating_sub(self.deceased)
    }
}

/// A validated, date-contiguous series of records for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTimeSeries {
    region: String,
    records: Vec<DailyRecord>,
}

impl RegionTimeSeries {
    /// Validates `records` and derives their `new_cases`. The first record has no predecessor,
    /// so its `new_cases` is zero.
    ///
    /// # Errors
    /// `DataGap` if dates are not consecutive days, a cumulative count decreases, the population
    /// is zero or an intervention score lies outside `[0, 1]`.
    pub fn new(
        region: impl Into<String>,
        mut records: Vec<DailyRecord>,
    ) -> Result<Self, ProjectionError> {
        let region = region.into();
        for i in 0..records.len() {
            let record = &records[i];
            if record.population == 0 {
                return Err(ProjectionError::DataGap(format!(
                    "{region}: zero population on {}",
                    record.date
                )));
            }
            if let Some(score) = record.intervention_score {
                if !(0.0..=1.0).contains(&score) {
                    return Err(ProjectionError::DataGap(format!(
                        "{region}: intervention score {score} out of range on {}",
                        record.date
                    )));
                }
            }
            if i == 0 {
                records[0].new_cases = 0;
                continue;
            }
            let previous = &records[i - 1];
            if previous.date.succ_opt() != Some(record.date) {
                return Err(ProjectionError::DataGap(format!(
                    "{region}: {} does not follow {}",
                    record.date, previous.date
                )));
            }
            if record.confirmed < previous.confirmed
                || record.recovered < previous.recovered
                || record.deceased < previous.deceased
            {
                return Err(ProjectionError::DataGap(format!(
                    "{region}: cumulative counts decrease on {}",
                    record.date
                )));
            }
            let new_cases = record.confirmed - previous.confirmed;
            records[i].new_cases = new_cases;
        }
        Ok(RegionTimeSeries { region, records })
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Daily new cases as floats, aligned with `records()`.
    #[must_use]
    pub fn new_cases(&self) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        self.records.iter().map(|r| r.new_cases as f64).collect()
    }

    /// Largest cumulative confirmed count in the series.
    #[must_use]
    pub fn total_confirmed(&self) -> u64 {
        self.records.last().map_or(0, |r| r.confirmed)
    }
}

/// Supplies the series of a single region, or of a whole country when the region identifier
/// equals the country code.
pub trait RegionDataProvider {
    /// # Errors
    /// `UnknownRegion` when the provider has no data for the region.
    fn get_region_series(
        &self,
        country_code: &str,
        region_identifier: &str,
    ) -> Result<RegionTimeSeries, ProjectionError>;
}

/// Supplies `(date, stringency)` pairs for a country. Unknown countries yield an empty series.
pub trait InterventionDataProvider {
    /// # Errors
    /// Provider specific.
    fn get_intervention_series(
        &self,
        country_code: &str,
    ) -> Result<Vec<(NaiveDate, f64)>, ProjectionError>;
}

/// Supplies every region known to the data source, keyed by region identifier.
pub trait HistoricalCorpusProvider {
    /// # Errors
    /// Provider specific.
    fn get_all_region_series(&self) -> Result<BTreeMap<String, RegionTimeSeries>, ProjectionError>;
}

/// Remembers the best parameters found for a region between runs.
pub trait ParameterStore {
    /// # Errors
    /// Provider specific (e.g. unreadable storage).
    fn load_last_params(
        &self,
        region: &str,
    ) -> Result<Option<SimulationParameters>, ProjectionError>;
    /// # Errors
    /// Provider specific (e.g. unwritable storage).
    fn save_params(
        &self,
        region: &str,
        params: &SimulationParameters,
    ) -> Result<(), ProjectionError>;
}

/// Region series held in memory, keyed by region identifier. A country-wide series is stored
/// under its country code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegionData {
    regions: BTreeMap<String, RegionTimeSeries>,
}

impl InMemoryRegionData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: RegionTimeSeries) {
        self.regions.insert(series.region().to_string(), series);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl RegionDataProvider for InMemoryRegionData {
    fn get_region_series(
        &self,
        _country_code: &str,
        region_identifier: &str,
    ) -> Result<RegionTimeSeries, ProjectionError> {
        self.regions
            .get(region_identifier)
            .cloned()
            .ok_or_else(|| ProjectionError::UnknownRegion(region_identifier.to_string()))
    }
}

impl HistoricalCorpusProvider for InMemoryRegionData {
    fn get_all_region_series(&self) -> Result<BTreeMap<String, RegionTimeSeries>, ProjectionError> {
        Ok(self.regions.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInterventions {
    by_country: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

impl InMemoryInterventions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, country_code: impl Into<String>, series: Vec<(NaiveDate, f64)>) {
        self.by_country.insert(country_code.into(), series);
    }
}

impl InterventionDataProvider for InMemoryInterventions {
    fn get_intervention_series(
        &self,
        country_code: &str,
    ) -> Result<Vec<(NaiveDate, f64)>, ProjectionError> {
        Ok(self.by_country.get(country_code).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    params: Mutex<BTreeMap<String, SimulationParameters>>,
}

impl InMemoryParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParameterStore for InMemoryParameterStore {
    fn load_last_params(
        &self,
        region: &str,
    ) -> Result<Option<SimulationParameters>, ProjectionError> {
        let params = self
            .params
            .lock()
            .map_err(|_| ProjectionError::Other("parameter store lock poisoned".to_string()))?;
        Ok(params.get(region).cloned())
    }

    fn save_params(
        &self,
        region: &str,
        params: &SimulationParameters,
    ) -> Result<(), ProjectionError> {
        self.params
            .lock()
            .map_err(|_| ProjectionError::Other("parameter store lock poisoned".to_string()))?
            .insert(region.to_string(), params.clone());
        Ok(())
    }
}

// Counts are signed so negative values surface as data gaps rather than parse errors.
#[derive(Debug, Deserialize)]
struct CsvRow {
    region: String,
    date: String,
    confirmed: i64,
    #[serde(default)]
    recovered: i64,
    #[serde(default)]
    deceased: i64,
    population: u64,
    intervention_score: Option<f64>,
}

impl CsvRow {
    fn count(&self, field: &str, value: i64) -> Result<u64, ProjectionError> {
        u64::try_from(value).map_err(|_| {
            ProjectionError::DataGap(format!(
                "{} on {}: negative {field} count {value}",
                self.region, self.date
            ))
        })
    }
}

/// Loads `region,date,confirmed,recovered,deceased,population,intervention_score` rows into one
/// validated series per region. Rows may appear in any order; dates are `YYYY-MM-DD`.
///
/// # Errors
/// CSV, date-parsing and I/O errors, `DataGap` for negative counts, plus the `DataGap`
/// conditions of [`RegionTimeSeries::new`].
pub fn load_regions_csv(path: &Path) -> Result<InMemoryRegionData, ProjectionError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut grouped: BTreeMap<String, Vec<DailyRecord>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: CsvRow = row?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")?;
        let record = DailyRecord {
            date,
            confirmed: row.count("confirmed", row.confirmed)?,
            new_cases: 0,
            recovered: row.count("recovered", row.recovered)?,
            deceased: row.count("deceased", row.deceased)?,
            population: row.population,
            intervention_score: row.intervention_score,
        };
        grouped.entry(row.region).or_default().push(record);
    }

    let mut data = InMemoryRegionData::new();
    for (region, mut records) in grouped {
        records.sort_by_key(|r| r.date);
        debug!("loaded {} records for {region}", records.len());
        data.insert(RegionTimeSeries::new(region, records)?);
    }
    Ok(data)
}
