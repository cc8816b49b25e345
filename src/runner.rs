//! Orchestrates one projection: fetch and window the region data, pick parameters (learned from
//! the region's own fitment window, seeded by similar historical curves, or reused from the
//! parameter store), run the simulator forward and package a [`ProjectionResult`].
//!
//! Each stage is its own type, so the stages can only be driven in order:
//!
//! ```text
//! ConfigLoaded -> DataPrepared -> Calibrated -> Simulated -> ProjectionResult
//! ```
//!
//! [`ProjectionRunner`] drives the whole sequence against the data collaborators.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::ProjectionConfig;
use crate::data::{
    HistoricalCorpusProvider, InterventionDataProvider, ParameterStore, RegionDataProvider,
    RegionTimeSeries,
};
use crate::error::ProjectionError;
use crate::intervention::{align_scores, extend_forward, influence_series};
use crate::log::{debug, info, warn};
use crate::optimizer::{FitmentWindow, ParameterOptimizer, SearchSeeds};
use crate::random::seeded_rng;
use crate::similarity::{growth_series, CandidateWindow, CurveSimilarityMatcher};
use crate::simulator::{EpidemicSimulator, SimulationParameters};

/// Days of fitment data averaged by the constant-rate baseline.
const BASELINE_DAYS: usize = 7;

/// The invocation surface of a single projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRequest {
    pub country_code: String,
    /// Ignored when `country_level_projection` is set.
    pub region_identifier: String,
    /// `None` takes the population of the last observed record.
    pub population: Option<u64>,
    /// Daily tests available; `f64::INFINITY` for no cap.
    pub testing_capacity: f64,
    pub fitment_days: usize,
    /// Trailing days of the data held out of fitting and used to score the projection.
    pub test_days: usize,
    /// Days projected from the first test day on; must cover the test window.
    pub projection_days: usize,
    pub learn_params: bool,
    pub country_level_projection: bool,
    /// Ceiling of the intervention influence, in `[0, 1]`.
    pub intervention_influence_pctg: f64,
}

impl ProjectionRequest {
    /// A request for `region_identifier` with unlimited testing, no intervention influence and
    /// learned parameters.
    #[must_use]
    pub fn new(
        country_code: impl Into<String>,
        region_identifier: impl Into<String>,
        fitment_days: usize,
        test_days: usize,
        projection_days: usize,
    ) -> Self {
        ProjectionRequest {
            country_code: country_code.into(),
            region_identifier: region_identifier.into(),
            population: None,
            testing_capacity: f64::INFINITY,
            fitment_days,
            test_days,
            projection_days,
            learn_params: true,
            country_level_projection: false,
            intervention_influence_pctg: 0.0,
        }
    }

    /// The name results and stored parameters are filed under.
    #[must_use]
    pub fn region_name(&self) -> &str {
        if self.country_level_projection {
            &self.country_code
        } else {
            &self.region_identifier
        }
    }

    /// # Errors
    /// `InvalidParameter` describing the first offending field.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        let invalid = |message: String| Err(ProjectionError::InvalidParameter(message));
        if self.fitment_days < 2 {
            return invalid(format!("fitment_days must be at least 2, got {}", self.fitment_days));
        }
        if self.projection_days < self.test_days {
            return invalid(format!(
                "projection_days ({}) must cover test_days ({})",
                self.projection_days, self.test_days
            ));
        }
        if self.population == Some(0) {
            return invalid("population must be positive".to_string());
        }
        if self.testing_capacity.is_nan() || self.testing_capacity < 0.0 {
            return invalid(format!(
                "testing_capacity must be non-negative, got {}",
                self.testing_capacity
            ));
        }
        if !(0.0..=1.0).contains(&self.intervention_influence_pctg) {
            return invalid(format!(
                "intervention_influence_pctg must be in [0, 1], got {}",
                self.intervention_influence_pctg
            ));
        }
        Ok(())
    }
}

/// Where the calibrated parameters come from; consumed by [`DataPrepared::calibrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSource {
    Learn,
    Reuse(SimulationParameters),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterOrigin {
    Learned,
    Reused,
}

/// The output of one run. Never mutated after it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub region: String,
    /// Date of the last observed record the projection was generated from.
    pub generation_date: NaiveDate,
    /// Date of `daily_projected_cases[0]`, the first test day.
    pub projection_start: NaiveDate,
    /// Confirmed count on the day before `projection_start`.
    pub confirmed_at_start: u64,
    pub daily_projected_cases: Vec<f64>,
    pub test_window_error: f64,
    /// Error of holding the mean of the last week of fitment data constant over the test window.
    pub baseline_test_error: f64,
    /// Fitment error of the chosen parameters; `None` when they were reused.
    pub fit_error: Option<f64>,
    pub chosen_parameters: SimulationParameters,
    pub parameter_origin: ParameterOrigin,
    pub candidates: Vec<CandidateWindow>,
}

impl ProjectionResult {
    /// Running total of the projected new cases on top of `start`.
    #[must_use]
    pub fn cumulative_projection(&self, start: f64) -> Vec<f64> {
        self.daily_projected_cases
            .iter()
            .scan(start, |total, cases| {
                *total += cases;
                Some(*total)
            })
            .collect()
    }

    /// The calendar date of projection day `day`.
    #[must_use]
    pub fn date_of(&self, day: usize) -> Option<NaiveDate> {
        self.projection_start.checked_add_days(Days::new(day as u64))
    }
}

/// A validated configuration, ready to take a request.
#[derive(Debug, Clone)]
pub struct ConfigLoaded {
    config: ProjectionConfig,
    simulator: EpidemicSimulator,
}

impl ConfigLoaded {
    /// # Errors
    /// `InvalidParameter` if the configuration does not validate.
    pub fn new(config: ProjectionConfig) -> Result<Self, ProjectionError> {
        config.validate()?;
        let simulator = EpidemicSimulator::new(config.simulator.clone())?;
        Ok(ConfigLoaded { config, simulator })
    }

    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Fetches the region series and its interventions and cuts the fitment and test windows.
    ///
    /// # Errors
    /// - `InvalidParameter` for a malformed request.
    /// - `InsufficientHistory` if the series has fewer than `fitment_days + test_days` records.
    /// - Whatever the providers fail with, `DataGap` and `UnknownRegion` included.
    pub fn prepare(
        self,
        request: &ProjectionRequest,
        regions: &dyn RegionDataProvider,
        interventions: &dyn InterventionDataProvider,
    ) -> Result<DataPrepared, ProjectionError> {
        request.validate()?;
        let region = request.region_name().to_string();
        let series = regions.get_region_series(&request.country_code, &region)?;

        let fitment_days = request.fitment_days;
        let required = fitment_days + request.test_days;
        if series.len() < required {
            return Err(ProjectionError::InsufficientHistory {
                required,
                available: series.len(),
            });
        }
        let window_start = series.len() - required;
        let records = series.records();
        let window = &records[window_start..];

        let scores = align_scores(
            window,
            &interventions.get_intervention_series(&request.country_code)?,
        );
        let influence = extend_forward(
            influence_series(&scores, request.intervention_influence_pctg),
            fitment_days + request.projection_days,
        );

        let mut fitment = FitmentWindow::from_records(
            &window[..fitment_days],
            &records[..window_start],
            self.config.simulator.infectious_days,
            request.testing_capacity,
            influence,
        );
        if let Some(population) = request.population {
            fitment.population = population;
        }

        #[allow(clippy::cast_precision_loss)]
        let test_actual = window[fitment_days..]
            .iter()
            .map(|r| r.new_cases as f64)
            .collect();

        let fitment_growth = growth_series(
            &series.new_cases()[..window_start + fitment_days],
            self.config.matcher.smoothing_days,
        );
        let skip = fitment_growth.len().saturating_sub(fitment_days - 1);
        let target_growth = fitment_growth[skip..].to_vec();

        debug!(
            "{region}: fitment window starts {} with {} initial active cases",
            window[0].date, fitment.initial_active_cases
        );
        Ok(DataPrepared {
            loaded: self,
            region,
            series,
            window_start,
            fitment_days,
            projection_days: request.projection_days,
            fitment,
            test_actual,
            target_growth,
        })
    }
}

/// Region data cut into the fitment and test windows.
#[derive(Debug, Clone)]
pub struct DataPrepared {
    loaded: ConfigLoaded,
    region: String,
    series: RegionTimeSeries,
    window_start: usize,
    fitment_days: usize,
    projection_days: usize,
    fitment: FitmentWindow,
    test_actual: Vec<f64>,
    target_growth: Vec<f64>,
}

impl DataPrepared {
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn fitment_window(&self) -> &FitmentWindow {
        &self.fitment
    }

    /// Log growth of the smoothed new cases over the fitment window.
    #[must_use]
    pub fn target_growth(&self) -> &[f64] {
        &self.target_growth
    }

    /// Resolves `source` into the parameters used for the projection. Learning matches the
    /// fitment window's growth against `corpus` (the region itself excluded) and searches the
    /// configured parameter space extended by the peak weeks and growth rates of the matches.
    ///
    /// # Errors
    /// `NoFeasibleParameters` or `PartialResult` from the search, corpus provider errors, and
    /// `InvalidParameter` for reused parameters that do not validate.
    pub fn calibrate(
        self,
        source: ParameterSource,
        corpus: &dyn HistoricalCorpusProvider,
    ) -> Result<Calibrated, ProjectionError> {
        match source {
            ParameterSource::Reuse(params) => {
                params.validate()?;
                info!("{}: reusing stored parameters {params:?}", self.region);
                Ok(Calibrated {
                    prepared: self,
                    params,
                    origin: ParameterOrigin::Reused,
                    fit_error: None,
                    candidates: Vec::new(),
                })
            }
            ParameterSource::Learn => {
                let config = &self.loaded.config;
                let matcher = CurveSimilarityMatcher::new(config.matcher.clone());
                let corpus = corpus.get_all_region_series()?;
                let candidates =
                    matcher.find_candidates(&self.target_growth, &corpus, Some(&self.region));
                let seeds =
                    SearchSeeds::from_candidates(&candidates, config.simulator.infectious_days);
                debug!(
                    "{}: candidate peak weeks {:?}, transmission focus {:?}",
                    self.region, seeds.peak_weeks, seeds.transmission_focus
                );

                let optimizer =
                    ParameterOptimizer::new(self.loaded.simulator.clone(), config.search.clone())?;
                let mut rng = seeded_rng(config.random_seed, "ParameterSearch");
                let best = optimizer.optimize(
                    &self.fitment,
                    &seeds,
                    config.transmission_bounds,
                    &mut rng,
                )?;
                info!(
                    "{}: learned {:?} with fitment error {:.4}",
                    self.region, best.params, best.error
                );
                Ok(Calibrated {
                    prepared: self,
                    params: best.params,
                    origin: ParameterOrigin::Learned,
                    fit_error: Some(best.error),
                    candidates,
                })
            }
        }
    }
}

/// Data with the parameters chosen for it.
#[derive(Debug, Clone)]
pub struct Calibrated {
    prepared: DataPrepared,
    params: SimulationParameters,
    origin: ParameterOrigin,
    fit_error: Option<f64>,
    candidates: Vec<CandidateWindow>,
}

impl Calibrated {
    #[must_use]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[must_use]
    pub fn origin(&self) -> ParameterOrigin {
        self.origin
    }

    /// Runs the simulator from the first fitment day through the end of the projection.
    ///
    /// # Errors
    /// `InvalidParameter` if the simulation inputs are malformed.
    pub fn simulate(self) -> Result<Simulated, ProjectionError> {
        let prepared = &self.prepared;
        let fitment = &prepared.fitment;
        let simulated = prepared.loaded.simulator.simulate(
            &self.params,
            fitment.initial_active_cases,
            fitment.population,
            fitment.testing_capacity,
            prepared.fitment_days + prepared.projection_days,
            &fitment.influence,
        )?;
        Ok(Simulated {
            calibrated: self,
            simulated,
        })
    }
}

/// The full simulated curve, fitment days included.
#[derive(Debug, Clone)]
pub struct Simulated {
    calibrated: Calibrated,
    simulated: Vec<f64>,
}

impl Simulated {
    #[must_use]
    pub fn simulated(&self) -> &[f64] {
        &self.simulated
    }

    /// Scores the test window and packages the result.
    #[must_use]
    pub fn report(self) -> ProjectionResult {
        let Simulated {
            calibrated,
            simulated,
        } = self;
        let Calibrated {
            prepared,
            params,
            origin,
            fit_error,
            candidates,
        } = calibrated;
        let config = &prepared.loaded.config;
        let metric = config.search.error_metric;
        let fitment_days = prepared.fitment_days;

        let daily_projected_cases = simulated[fitment_days..].to_vec();
        let test_days = prepared.test_actual.len();
        let test_window_error = if test_days == 0 {
            0.0
        } else {
            metric.score(&daily_projected_cases[..test_days], &prepared.test_actual)
        };

        let recent = &prepared.fitment.actual_new_cases
            [fitment_days.saturating_sub(BASELINE_DAYS)..];
        #[allow(clippy::cast_precision_loss)]
        let constant_rate = recent.iter().sum::<f64>() / recent.len() as f64;
        let baseline_test_error = if test_days == 0 {
            0.0
        } else {
            metric.score(&vec![constant_rate; test_days], &prepared.test_actual)
        };
        if test_window_error > baseline_test_error {
            warn!(
                "{}: projection error {test_window_error:.4} exceeds the constant-rate baseline \
                 {baseline_test_error:.4}",
                prepared.region
            );
        }

        let records = prepared.series.records();
        let start = &records[prepared.window_start + fitment_days - 1];
        let projection_start = start.date.succ_opt().unwrap_or(start.date);
        let generation_date = records.last().map_or(start.date, |r| r.date);

        ProjectionResult {
            region: prepared.region,
            generation_date,
            projection_start,
            confirmed_at_start: start.confirmed,
            daily_projected_cases,
            test_window_error,
            baseline_test_error,
            fit_error,
            chosen_parameters: params,
            parameter_origin: origin,
            candidates,
        }
    }
}

/// Runs projections against a fixed set of data collaborators.
pub struct ProjectionRunner<'a> {
    config: ProjectionConfig,
    regions: &'a dyn RegionDataProvider,
    interventions: &'a dyn InterventionDataProvider,
    corpus: &'a dyn HistoricalCorpusProvider,
    store: &'a dyn ParameterStore,
}

impl<'a> ProjectionRunner<'a> {
    #[must_use]
    pub fn new(
        config: ProjectionConfig,
        regions: &'a dyn RegionDataProvider,
        interventions: &'a dyn InterventionDataProvider,
        corpus: &'a dyn HistoricalCorpusProvider,
        store: &'a dyn ParameterStore,
    ) -> Self {
        ProjectionRunner {
            config,
            regions,
            interventions,
            corpus,
            store,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Learns or loads parameters according to `request.learn_params`.
    ///
    /// # Errors
    /// `MissingStoredParameters` when reuse is requested and nothing is stored for the region.
    pub fn parameter_source(
        &self,
        request: &ProjectionRequest,
    ) -> Result<ParameterSource, ProjectionError> {
        if request.learn_params {
            return Ok(ParameterSource::Learn);
        }
        let region = request.region_name();
        match self.store.load_last_params(region)? {
            Some(params) => Ok(ParameterSource::Reuse(params)),
            None => Err(ProjectionError::MissingStoredParameters(region.to_string())),
        }
    }

    /// Runs one projection end to end. Learned parameters are saved to the parameter store.
    ///
    /// # Errors
    /// Any error of the individual stages, see [`ConfigLoaded::prepare`],
    /// [`DataPrepared::calibrate`] and [`Calibrated::simulate`]. Data errors are reported before
    /// [`ProjectionRunner::parameter_source`] consults the store.
    pub fn run(&self, request: &ProjectionRequest) -> Result<ProjectionResult, ProjectionError> {
        let prepared = ConfigLoaded::new(self.config.clone())?.prepare(
            request,
            self.regions,
            self.interventions,
        )?;
        let source = self.parameter_source(request)?;
        let calibrated = prepared.calibrate(source, self.corpus)?;
        if calibrated.origin() == ParameterOrigin::Learned {
            self.store.save_params(request.region_name(), calibrated.params())?;
        }
        let result = calibrated.simulate()?.report();
        info!(
            "{}: projected {} days from {}, test error {:.4}",
            result.region,
            result.daily_projected_cases.len(),
            result.projection_start,
            result.test_window_error
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::config::SearchConfig;
    use crate::data::{
        DailyRecord, InMemoryInterventions, InMemoryParameterStore, InMemoryRegionData,
    };

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
    }

    fn region(name: &str, confirmed: &[u64], population: u64) -> RegionTimeSeries {
        let records = confirmed
            .iter()
            .enumerate()
            .map(|(i, c)| DailyRecord::new(start() + Days::new(i as u64), *c, population))
            .collect();
        RegionTimeSeries::new(name, records).unwrap()
    }

    fn growing(days: usize) -> Vec<u64> {
        (0..days)
            .map(|d| (100.0 * 1.05f64.powi(d as i32)).round() as u64)
            .collect()
    }

    fn small_config() -> ProjectionConfig {
        ProjectionConfig {
            search: SearchConfig {
                default_peak_weeks: vec![1, 2, 3, 4],
                wave1_spreads: vec![7.0, 28.0],
                transmission_steps: 10,
                ..SearchConfig::default()
            },
            ..ProjectionConfig::default()
        }
    }

    fn data(series: RegionTimeSeries) -> InMemoryRegionData {
        let mut data = InMemoryRegionData::new();
        data.insert(series);
        data
    }

    #[test]
    fn request_validation() {
        let request = ProjectionRequest::new("US", "NY", 14, 5, 60);
        assert!(request.validate().is_ok());
        assert!(ProjectionRequest::new("US", "NY", 1, 5, 60).validate().is_err());
        assert!(ProjectionRequest::new("US", "NY", 14, 5, 4).validate().is_err());
        let request = ProjectionRequest {
            intervention_influence_pctg: 1.5,
            ..ProjectionRequest::new("US", "NY", 14, 5, 60)
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn country_level_uses_country_code() {
        let request = ProjectionRequest {
            country_level_projection: true,
            ..ProjectionRequest::new("IN", "KL", 14, 5, 60)
        };
        assert_eq!(request.region_name(), "IN");
    }

    #[test]
    fn prepare_cuts_windows() {
        let data = data(region("NY", &growing(40), 1_000_000));
        let request = ProjectionRequest::new("US", "NY", 14, 5, 30);
        let prepared = ConfigLoaded::new(small_config())
            .unwrap()
            .prepare(&request, &data, &InMemoryInterventions::new())
            .unwrap();
        let fitment = prepared.fitment_window();
        assert_eq!(fitment.len(), 14);
        assert_eq!(fitment.population, 1_000_000);
        assert_eq!(fitment.influence, vec![0.0; 44]);
        assert_eq!(prepared.target_growth().len(), 13);
        assert_eq!(prepared.test_actual.len(), 5);
        // window starts at day 21; the ten days before it hold the active pool
        let new_cases = data.get_region_series("US", "NY").unwrap().new_cases();
        let expected: f64 = new_cases[11..21].iter().sum();
        assert_almost_eq!(fitment.initial_active_cases, expected, 1e-9);
    }

    #[test]
    fn short_history_fails() {
        let data = data(region("NY", &growing(18), 1_000_000));
        let request = ProjectionRequest::new("US", "NY", 14, 5, 30);
        let result = ConfigLoaded::new(small_config())
            .unwrap()
            .prepare(&request, &data, &InMemoryInterventions::new());
        assert!(matches!(
            result,
            Err(ProjectionError::InsufficientHistory {
                required: 19,
                available: 18
            })
        ));
    }

    #[test]
    fn interventions_are_scaled_and_extended() {
        let data = data(region("NY", &growing(30), 1_000_000));
        let mut interventions = InMemoryInterventions::new();
        let scores = (0..30).map(|d| (start() + Days::new(d), 0.5)).collect();
        interventions.insert("US", scores);
        let request = ProjectionRequest {
            intervention_influence_pctg: 0.4,
            ..ProjectionRequest::new("US", "NY", 10, 5, 20)
        };
        let prepared = ConfigLoaded::new(small_config())
            .unwrap()
            .prepare(&request, &data, &interventions)
            .unwrap();
        let influence = &prepared.fitment_window().influence;
        assert_eq!(influence.len(), 30);
        assert!(influence.iter().all(|v| (*v - 0.2).abs() < 1e-12));
    }

    #[test]
    fn reuse_without_stored_parameters_fails() {
        let data = data(region("NY", &growing(40), 1_000_000));
        let store = InMemoryParameterStore::new();
        let interventions = InMemoryInterventions::new();
        let runner = ProjectionRunner::new(small_config(), &data, &interventions, &data, &store);
        let request = ProjectionRequest {
            learn_params: false,
            ..ProjectionRequest::new("US", "NY", 14, 5, 30)
        };
        assert!(matches!(
            runner.run(&request),
            Err(ProjectionError::MissingStoredParameters(region)) if region == "NY"
        ));
    }

    #[test]
    fn reuse_with_short_history_reports_the_history() {
        let data = data(region("MH", &growing(10), 1_000_000));
        let store = InMemoryParameterStore::new();
        let interventions = InMemoryInterventions::new();
        let runner = ProjectionRunner::new(small_config(), &data, &interventions, &data, &store);
        let request = ProjectionRequest {
            learn_params: false,
            ..ProjectionRequest::new("IN", "MH", 14, 5, 30)
        };
        assert!(matches!(
            runner.run(&request),
            Err(ProjectionError::InsufficientHistory {
                required: 19,
                available: 10
            })
        ));
    }

    #[test]
    fn learned_parameters_are_stored_and_reused() {
        let data = data(region("NY", &growing(40), 1_000_000));
        let store = InMemoryParameterStore::new();
        let interventions = InMemoryInterventions::new();
        let runner = ProjectionRunner::new(small_config(), &data, &interventions, &data, &store);

        let learned = runner.run(&ProjectionRequest::new("US", "NY", 14, 5, 30)).unwrap();
        assert_eq!(learned.parameter_origin, ParameterOrigin::Learned);
        assert!(learned.fit_error.is_some());
        assert_eq!(
            store.load_last_params("NY").unwrap(),
            Some(learned.chosen_parameters)
        );

        let request = ProjectionRequest {
            learn_params: false,
            ..ProjectionRequest::new("US", "NY", 14, 5, 30)
        };
        let reused = runner.run(&request).unwrap();
        assert_eq!(reused.parameter_origin, ParameterOrigin::Reused);
        assert_eq!(reused.chosen_parameters, learned.chosen_parameters);
        assert_eq!(reused.daily_projected_cases, learned.daily_projected_cases);
        assert_eq!(reused.fit_error, None);
    }

    #[test]
    fn result_dates_and_cumulative() {
        let data = data(region("NY", &growing(40), 1_000_000));
        let store = InMemoryParameterStore::new();
        let interventions = InMemoryInterventions::new();
        let runner = ProjectionRunner::new(small_config(), &data, &interventions, &data, &store);
        let result = runner.run(&ProjectionRequest::new("US", "NY", 14, 5, 30)).unwrap();

        assert_eq!(result.daily_projected_cases.len(), 30);
        assert_eq!(result.generation_date, start() + Days::new(39));
        // first test day follows the fitment window
        assert_eq!(result.projection_start, start() + Days::new(35));
        assert_eq!(result.date_of(2), Some(start() + Days::new(37)));
        assert_eq!(result.confirmed_at_start, growing(40)[34]);

        let cumulative = result.cumulative_projection(10.0);
        assert_eq!(cumulative.len(), 30);
        assert_almost_eq!(cumulative[0], 10.0 + result.daily_projected_cases[0], 1e-9);
        assert!(cumulative.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn baseline_holds_last_week_constant() {
        // flat series: 10 new cases per day, so the baseline is exact
        let confirmed: Vec<u64> = (0..30).map(|d| 100 + 10 * d).collect();
        let data = data(region("NY", &confirmed, 1_000_000));
        let store = InMemoryParameterStore::new();
        let interventions = InMemoryInterventions::new();
        let runner = ProjectionRunner::new(small_config(), &data, &interventions, &data, &store);
        let result = runner.run(&ProjectionRequest::new("US", "NY", 14, 5, 10)).unwrap();
        assert_almost_eq!(result.baseline_test_error, 0.0, 1e-12);
        assert!(result.test_window_error.is_finite());
    }
}
