//! Fits [`SimulationParameters`] to a window of observed cases by scoring every candidate of a
//! bounded search space and keeping the one with the lowest error.
//!
//! Candidates are independent, so each batch is scored in parallel with `rayon`; the reduction
//! walks the scores in candidate order and keeps the first minimum, which makes the outcome
//! independent of evaluation order and thread count.
//!
//! Curve matching feeds the search through [`SearchSeeds`]. Seeds only ever add candidates to
//! the configured space, so a grid search with seeds never ends with a larger error than the
//! same search without them.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::Rng;
use rayon::prelude::*;

use crate::config::{SearchConfig, SearchStrategy, TransmissionBounds};
use crate::data::DailyRecord;
use crate::error::{PartialSearch, ProjectionError};
use crate::log::{debug, info, trace};
use crate::similarity::CandidateWindow;
use crate::simulator::{EpidemicSimulator, SecondWave, SimulationParameters};

// Multiples of the implied transmission probability spanned by the focused β band. β sits above
// the effective probability whenever the surge shape is below its peak value of 1.
const FOCUS_BELOW: f64 = 0.5;
const FOCUS_ABOVE: f64 = 4.0;

/// Observed data and initial conditions for one calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct FitmentWindow {
    /// Observed daily new cases; day 0 is the first simulated day.
    pub actual_new_cases: Vec<f64>,
    pub initial_active_cases: f64,
    pub population: u64,
    pub testing_capacity: f64,
    /// Intervention influence per day, see [`crate::intervention::influence_series`].
    pub influence: Vec<f64>,
}

impl FitmentWindow {
    /// Builds a window from `records`, taking the initial active pool from the new cases of the
    /// last `infectious_days` records in `preceding`. With nothing preceding the window, the
    /// first record's `confirmed - recovered - deceased` is used instead.
    #[must_use]
    pub fn from_records(
        records: &[DailyRecord],
        preceding: &[DailyRecord],
        infectious_days: usize,
        testing_capacity: f64,
        influence: Vec<f64>,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let initial_active_cases = if preceding.is_empty() {
            records.first().map_or(0.0, |r| r.active() as f64)
        } else {
            let skip = preceding.len().saturating_sub(infectious_days);
            preceding[skip..].iter().map(|r| r.new_cases as f64).sum()
        };
        #[allow(clippy::cast_precision_loss)]
        let actual_new_cases = records.iter().map(|r| r.new_cases as f64).collect();
        FitmentWindow {
            actual_new_cases,
            initial_active_cases,
            population: records.last().map_or(0, |r| r.population),
            testing_capacity,
            influence,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actual_new_cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actual_new_cases.is_empty()
    }
}

/// What curve matching contributes to a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSeeds {
    /// Matched weeks-to-peak. Each is searched together with the weeks either side of it.
    pub peak_weeks: BTreeSet<u32>,
    /// Transmission probability the β grid is concentrated around.
    pub transmission_focus: Option<f64>,
}

impl SearchSeeds {
    /// Peak weeks of every candidate, and the transmission probability implied by their matched
    /// growth rates weighted by similarity.
    #[must_use]
    pub fn from_candidates(candidates: &[CandidateWindow], infectious_days: usize) -> Self {
        let peak_weeks = candidates.iter().map(|c| c.weeks_to_peak).collect();
        let weight: f64 = candidates.iter().map(|c| c.similarity_score).sum();
        let transmission_focus = if weight > 0.0 {
            let rate = candidates
                .iter()
                .map(|c| c.similarity_score * c.matched_rate)
                .sum::<f64>()
                / weight;
            implied_transmission(rate, infectious_days)
        } else {
            None
        };
        SearchSeeds {
            peak_weeks,
            transmission_focus,
        }
    }
}

/// The constant transmission probability under which daily infections grow by `rate` when each
/// infection stays active for `infectious_days` days, the root of `1 = p · Σₖ (1 + rate)⁻ᵏ`
/// over `k = 1..=infectious_days`.
#[must_use]
pub fn implied_transmission(rate: f64, infectious_days: usize) -> Option<f64> {
    if !(rate.is_finite() && rate > -1.0) || infectious_days == 0 {
        return None;
    }
    let days = i32::try_from(infectious_days).ok()?;
    if rate.abs() < 1e-12 {
        return Some(1.0 / f64::from(days));
    }
    Some(rate / (1.0 - (1.0 + rate).powi(-days)))
}

/// The winning candidate of a completed search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizedParameters {
    pub params: SimulationParameters,
    pub error: f64,
    pub evaluated: usize,
}

#[derive(Debug, Clone)]
pub struct ParameterOptimizer {
    simulator: EpidemicSimulator,
    search: SearchConfig,
}

impl ParameterOptimizer {
    /// # Errors
    /// `InvalidParameter` if the search configuration does not validate.
    pub fn new(
        simulator: EpidemicSimulator,
        search: SearchConfig,
    ) -> Result<Self, ProjectionError> {
        search.validate()?;
        Ok(ParameterOptimizer { simulator, search })
    }

    #[must_use]
    pub fn simulator(&self) -> &EpidemicSimulator {
        &self.simulator
    }

    #[must_use]
    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// The error of `params` over the window, or NaN when the simulation is not possible.
    #[must_use]
    pub fn evaluate(&self, window: &FitmentWindow, params: &SimulationParameters) -> f64 {
        match self.simulator.simulate(
            params,
            window.initial_active_cases,
            window.population,
            window.testing_capacity,
            window.len(),
            &window.influence,
        ) {
            Ok(simulated) => self
                .search
                .error_metric
                .score(&simulated, &window.actual_new_cases),
            Err(_) => f64::NAN,
        }
    }

    /// Seeded weeks and their neighbours first, then the rest of the default range.
    fn peak_weeks(&self, seeds: &SearchSeeds) -> Vec<u32> {
        let mut weeks: Vec<u32> = Vec::new();
        let neighbourhoods = seeds
            .peak_weeks
            .iter()
            .flat_map(|week| [week.saturating_sub(1), *week, week.saturating_add(1)]);
        for week in neighbourhoods.chain(self.search.default_peak_weeks.iter().copied()) {
            if week > 0 && !weeks.contains(&week) {
                weeks.push(week);
            }
        }
        weeks
    }

    fn focus_band(focus: Option<f64>, bounds: TransmissionBounds) -> Option<TransmissionBounds> {
        let focus = focus.filter(|f| f.is_finite() && *f > 0.0)?;
        let min = (focus * FOCUS_BELOW).max(bounds.min);
        let max = (focus * FOCUS_ABOVE).min(bounds.max);
        (min < max).then_some(TransmissionBounds { min, max })
    }

    /// The configured grid over `bounds`, merged with an equally dense grid over the focus band.
    fn transmission_grid(&self, bounds: TransmissionBounds, focus: Option<f64>) -> Vec<f64> {
        let steps = self.search.transmission_steps;
        let mut grid = bounds.grid(steps);
        if let Some(band) = Self::focus_band(focus, bounds) {
            grid.extend(band.grid(steps));
            grid.sort_by(f64::total_cmp);
            grid.dedup();
        }
        grid
    }

    /// Second-wave options for a first wave peaking in `week`; `None` always comes first.
    fn second_waves(&self, week: u32) -> Vec<Option<SecondWave>> {
        let mut options = vec![None];
        if let Some(search) = &self.search.second_wave {
            for offset in &search.offsets_weeks {
                for spread in &search.spreads {
                    for ratio in &search.amplitude_ratios {
                        options.push(Some(SecondWave {
                            peak_week: week + offset,
                            spread: *spread,
                            amplitude_ratio: *ratio,
                        }));
                    }
                }
            }
        }
        options
    }

    /// Every grid point, ordered by peak week, spread, transmission probability and second wave.
    #[must_use]
    pub fn grid_candidates(
        &self,
        seeds: &SearchSeeds,
        bounds: TransmissionBounds,
    ) -> Vec<SimulationParameters> {
        let probabilities = self.transmission_grid(bounds, seeds.transmission_focus);
        let mut candidates = Vec::new();
        for week in self.peak_weeks(seeds) {
            let second_waves = self.second_waves(week);
            for spread in &self.search.wave1_spreads {
                for probability in &probabilities {
                    for second_wave in &second_waves {
                        candidates.push(SimulationParameters {
                            transmission_probability: *probability,
                            wave1_peak_week: week,
                            wave1_spread: *spread,
                            second_wave: *second_wave,
                        });
                    }
                }
            }
        }
        candidates
    }

    /// `samples` candidates drawn from the grid's dimensions, with the transmission probability
    /// drawn continuously from `bounds`, or from the focus band for half of the draws when the
    /// seeds carry a focus.
    pub fn sample_candidates<R: Rng>(
        &self,
        seeds: &SearchSeeds,
        bounds: TransmissionBounds,
        samples: usize,
        rng: &mut R,
    ) -> Vec<SimulationParameters> {
        let weeks = self.peak_weeks(seeds);
        let spreads = &self.search.wave1_spreads;
        let band = Self::focus_band(seeds.transmission_focus, bounds);
        (0..samples)
            .map(|_| {
                let week = weeks[rng.random_range(0..weeks.len())];
                let spread = spreads[rng.random_range(0..spreads.len())];
                let range = match band {
                    Some(band) if rng.random_bool(0.5) => band,
                    _ => bounds,
                };
                let probability = rng.random_range(range.min..=range.max);
                let second_waves = self.second_waves(week);
                let second_wave = second_waves[rng.random_range(0..second_waves.len())];
                SimulationParameters {
                    transmission_probability: probability,
                    wave1_peak_week: week,
                    wave1_spread: spread,
                    second_wave,
                }
            })
            .collect()
    }

    /// Searches for the parameters that best reproduce `window` over the configured space
    /// extended by `seeds`. `rng` is only drawn from by the random strategy, so a seeded
    /// generator makes every search reproducible.
    ///
    /// # Errors
    /// - `InvalidParameter` if `bounds` are not a finite range.
    /// - `NoFeasibleParameters` if no candidate produced a finite error.
    /// - `PartialResult` if the time budget ran out before the space was exhausted.
    pub fn optimize<R: Rng>(
        &self,
        window: &FitmentWindow,
        seeds: &SearchSeeds,
        bounds: TransmissionBounds,
        rng: &mut R,
    ) -> Result<OptimizedParameters, ProjectionError> {
        if !(bounds.min.is_finite() && bounds.max.is_finite() && bounds.min <= bounds.max) {
            return Err(ProjectionError::InvalidParameter(format!(
                "transmission bounds [{}, {}] are not a finite range",
                bounds.min, bounds.max
            )));
        }
        let candidates = match self.search.strategy {
            SearchStrategy::Grid => self.grid_candidates(seeds, bounds),
            SearchStrategy::Random { samples } => {
                self.sample_candidates(seeds, bounds, samples, rng)
            }
        };
        self.search_candidates(window, &candidates)
    }

    /// Scores `candidates` in batches and returns the first one with the lowest finite error.
    ///
    /// # Errors
    /// See [`ParameterOptimizer::optimize`].
    pub fn search_candidates(
        &self,
        window: &FitmentWindow,
        candidates: &[SimulationParameters],
    ) -> Result<OptimizedParameters, ProjectionError> {
        let total = candidates.len();
        info!("searching {total} candidates over {} fitment days", window.len());
        let started = Instant::now();

        let mut best: Option<(usize, f64)> = None;
        let mut evaluated = 0;
        for batch in candidates.chunks(self.search.batch_size) {
            let errors: Vec<f64> = batch
                .par_iter()
                .map(|params| self.evaluate(window, params))
                .collect();
            for (offset, error) in errors.into_iter().enumerate() {
                let index = evaluated + offset;
                if !error.is_finite() {
                    continue;
                }
                if best.map_or(true, |(_, best_error)| error < best_error) {
                    trace!(
                        "candidate {index} improves error to {error:.6}: {:?}",
                        candidates[index]
                    );
                    best = Some((index, error));
                }
            }
            evaluated += batch.len();

            if evaluated < total {
                if let Some(budget) = self.search.time_budget {
                    if started.elapsed() >= budget {
                        debug!("time budget of {} exhausted", humantime::format_duration(budget));
                        return match best {
                            Some((index, error)) => {
                                Err(ProjectionError::PartialResult(Box::new(PartialSearch {
                                    best_params: candidates[index],
                                    best_error: error,
                                    evaluated,
                                    total,
                                })))
                            }
                            None => Err(ProjectionError::NoFeasibleParameters { evaluated }),
                        };
                    }
                }
            }
        }

        let millis = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let elapsed = Duration::from_millis(millis);
        let Some((index, error)) = best else {
            return Err(ProjectionError::NoFeasibleParameters { evaluated });
        };
        info!(
            "best error {error:.6} among {evaluated} candidates in {}",
            humantime::format_duration(elapsed)
        );
        Ok(OptimizedParameters {
            params: candidates[index],
            error,
            evaluated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SecondWaveSearch, SimulatorSettings};
    use crate::numeric::ErrorMetric;
    use chrono::{Days, NaiveDate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BOUNDS: TransmissionBounds = TransmissionBounds { min: 0.05, max: 1.0 };

    fn small_search() -> SearchConfig {
        SearchConfig {
            default_peak_weeks: vec![1, 2, 3, 4],
            wave1_spreads: vec![7.0, 14.0],
            transmission_steps: 20,
            batch_size: 16,
            ..SearchConfig::default()
        }
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn optimizer(search: SearchConfig) -> ParameterOptimizer {
        let simulator = EpidemicSimulator::new(SimulatorSettings::default()).unwrap();
        ParameterOptimizer::new(simulator, search).unwrap()
    }

    fn synthetic_window(
        optimizer: &ParameterOptimizer,
        truth: &SimulationParameters,
    ) -> FitmentWindow {
        let actual_new_cases = optimizer
            .simulator()
            .simulate(truth, 40.0, 200_000, f64::INFINITY, 28, &[])
            .unwrap();
        FitmentWindow {
            actual_new_cases,
            initial_active_cases: 40.0,
            population: 200_000,
            testing_capacity: f64::INFINITY,
            influence: Vec::new(),
        }
    }

    fn candidate(weeks_to_peak: u32, matched_rate: f64, similarity_score: f64) -> CandidateWindow {
        CandidateWindow {
            source_region: format!("R{weeks_to_peak}"),
            weeks_to_peak,
            matched_rate,
            similarity_score,
            distance: 1.0 / similarity_score - 1.0,
            source_cases: 1_000,
        }
    }

    #[test]
    fn grid_size_is_cartesian_product() {
        let optimizer = optimizer(small_search());
        assert_eq!(
            optimizer.grid_candidates(&SearchSeeds::default(), BOUNDS).len(),
            4 * 2 * 20
        );
    }

    #[test]
    fn seeded_weeks_extend_the_default_range() {
        let optimizer = optimizer(small_search());
        let seeds = SearchSeeds {
            peak_weeks: BTreeSet::from([2, 7]),
            transmission_focus: None,
        };
        let grid = optimizer.grid_candidates(&seeds, BOUNDS);
        // 1..=3 and 6..=8 around the seeds, then 4 from the default range
        assert_eq!(grid.len(), 7 * 2 * 20);
        assert_eq!(grid[0].wave1_peak_week, 1);
        assert_eq!(grid.last().unwrap().wave1_peak_week, 4);
        for week in [1, 2, 3, 4, 6, 7, 8] {
            assert!(grid.iter().any(|p| p.wave1_peak_week == week));
        }
        assert!(grid.iter().all(|p| p.wave1_peak_week != 5));
    }

    #[test]
    fn seeded_grid_contains_the_default_grid() {
        let optimizer = optimizer(small_search());
        let seeds = SearchSeeds {
            peak_weeks: BTreeSet::from([6]),
            transmission_focus: Some(0.13),
        };
        let seeded = optimizer.grid_candidates(&seeds, BOUNDS);
        let unseeded = optimizer.grid_candidates(&SearchSeeds::default(), BOUNDS);
        assert!(seeded.len() > unseeded.len());
        assert!(unseeded.iter().all(|p| seeded.contains(p)));
        // the focus band adds dense points between 0.065 and 0.52
        let focused = seeded
            .iter()
            .filter(|p| p.wave1_peak_week == 6 && p.wave1_spread == 7.0)
            .filter(|p| (0.065..=0.52).contains(&p.transmission_probability))
            .count();
        assert!(focused >= 20);
    }

    #[test]
    fn focus_outside_bounds_adds_nothing() {
        let optimizer = optimizer(small_search());
        let seeds = SearchSeeds {
            peak_weeks: BTreeSet::new(),
            transmission_focus: Some(50.0),
        };
        assert_eq!(
            optimizer.grid_candidates(&seeds, BOUNDS),
            optimizer.grid_candidates(&SearchSeeds::default(), BOUNDS)
        );
    }

    #[test]
    fn seeds_weight_rates_by_similarity() {
        let candidates = vec![candidate(5, 0.1, 1.0), candidate(3, 0.04, 0.5)];
        let seeds = SearchSeeds::from_candidates(&candidates, 10);
        assert_eq!(seeds.peak_weeks, BTreeSet::from([3, 5]));
        let expected = implied_transmission((0.1 + 0.5 * 0.04) / 1.5, 10).unwrap();
        crate::assert_almost_eq!(seeds.transmission_focus.unwrap(), expected, 1e-12);
        assert_eq!(SearchSeeds::from_candidates(&[], 10), SearchSeeds::default());
    }

    #[test]
    fn implied_transmission_reproduces_the_growth_rate() {
        assert_eq!(implied_transmission(0.0, 10), Some(0.1));
        assert_eq!(implied_transmission(f64::NAN, 10), None);
        assert_eq!(implied_transmission(-1.5, 10), None);

        let p = implied_transmission(0.05, 10).unwrap();
        // a spread this wide keeps the surge shape at 1 for the whole run
        let params = SimulationParameters::single_wave(p, 1, 1e7);
        let simulator = EpidemicSimulator::new(SimulatorSettings::default()).unwrap();
        let cases = simulator
            .simulate(&params, 10.0, 1_000_000_000_000, f64::INFINITY, 200, &[])
            .unwrap();
        let ratio = cases[199] / cases[198];
        assert!((ratio - 1.05).abs() < 1e-3, "daily growth {ratio}");
    }

    #[test]
    fn second_wave_grid() {
        let optimizer = optimizer(SearchConfig {
            second_wave: Some(SecondWaveSearch {
                offsets_weeks: vec![4, 8],
                spreads: vec![10.0],
                amplitude_ratios: vec![0.5],
            }),
            ..small_search()
        });
        let grid = optimizer.grid_candidates(&SearchSeeds::default(), BOUNDS);
        assert_eq!(grid.len(), 4 * 2 * 20 * 3);
        assert!(grid.iter().all(|p| p.validate().is_ok()));
        assert!(grid
            .iter()
            .filter_map(|p| p.second_wave.map(|w| (p.wave1_peak_week, w.peak_week)))
            .all(|(first, second)| second >= first + 4));
    }

    #[test]
    fn recovers_ground_truth_on_noiseless_data() {
        let optimizer = optimizer(small_search());
        let probabilities = BOUNDS.grid(20);
        let truth = SimulationParameters::single_wave(probabilities[7], 3, 14.0);
        let window = synthetic_window(&optimizer, &truth);

        let best = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(0))
            .unwrap();
        assert_eq!(optimizer.evaluate(&window, &truth), 0.0);
        assert_eq!(best.error, 0.0);
        assert_eq!(best.evaluated, 160);
        // Whatever won reproduces the data exactly.
        assert_eq!(optimizer.evaluate(&window, &best.params), 0.0);
        for candidate in optimizer.grid_candidates(&SearchSeeds::default(), BOUNDS) {
            assert!(optimizer.evaluate(&window, &truth) <= optimizer.evaluate(&window, &candidate));
        }
    }

    #[test]
    fn random_search_is_reproducible() {
        let optimizer = optimizer(SearchConfig {
            strategy: SearchStrategy::Random { samples: 60 },
            ..small_search()
        });
        let truth = SimulationParameters::single_wave(0.4, 2, 7.0);
        let window = synthetic_window(&optimizer, &truth);

        let first = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(11))
            .unwrap();
        let second = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(11))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.evaluated, 60);
        assert!(first.error.is_finite());
    }

    #[test]
    fn grid_search_is_reproducible() {
        let optimizer = optimizer(small_search());
        let truth = SimulationParameters::single_wave(0.4, 2, 7.0);
        let window = synthetic_window(&optimizer, &truth);
        let first = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(1))
            .unwrap();
        let second = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(2))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn result_independent_of_batch_size() {
        let truth = SimulationParameters::single_wave(0.4, 2, 7.0);
        let mut results = Vec::new();
        for batch_size in [1, 7, 1000] {
            let optimizer = optimizer(SearchConfig {
                batch_size,
                ..small_search()
            });
            let window = synthetic_window(&optimizer, &truth);
            results.push(
                optimizer
                    .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(0))
                    .unwrap(),
            );
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[test]
    fn degenerate_population_is_infeasible() {
        let optimizer = optimizer(small_search());
        let window = FitmentWindow {
            actual_new_cases: vec![5.0; 14],
            initial_active_cases: 10.0,
            population: 0,
            testing_capacity: f64::INFINITY,
            influence: Vec::new(),
        };
        let result = optimizer.optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(0));
        assert!(matches!(
            result,
            Err(ProjectionError::NoFeasibleParameters { evaluated: 160 })
        ));
    }

    #[test]
    fn zero_bounds_are_infeasible() {
        let optimizer = optimizer(small_search());
        let window = synthetic_window(&optimizer, &SimulationParameters::single_wave(0.4, 2, 7.0));
        let zero = TransmissionBounds { min: 0.0, max: 0.0 };
        assert!(matches!(
            optimizer.optimize(&window, &SearchSeeds::default(), zero, &mut rng(0)),
            Err(ProjectionError::NoFeasibleParameters { .. })
        ));
        let inverted = TransmissionBounds { min: 0.5, max: 0.1 };
        assert!(matches!(
            optimizer.optimize(&window, &SearchSeeds::default(), inverted, &mut rng(0)),
            Err(ProjectionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn exhausted_budget_returns_partial_result() {
        let optimizer = optimizer(SearchConfig {
            batch_size: 10,
            time_budget: Some(Duration::ZERO),
            ..small_search()
        });
        let truth = SimulationParameters::single_wave(0.4, 2, 7.0);
        let window = synthetic_window(&optimizer, &truth);
        match optimizer.optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(0)) {
            Err(ProjectionError::PartialResult(partial)) => {
                assert_eq!(partial.evaluated, 10);
                assert_eq!(partial.total, 160);
                assert!(partial.best_error.is_finite());
                assert_eq!(partial.best_params.wave1_peak_week, 1);
            }
            other => panic!("expected a partial result, got {other:?}"),
        }
    }

    #[test]
    fn nrmse_metric_also_recovers_truth() {
        let optimizer = optimizer(SearchConfig {
            error_metric: ErrorMetric::Nrmse,
            ..small_search()
        });
        let truth = SimulationParameters::single_wave(BOUNDS.grid(20)[12], 4, 7.0);
        let window = synthetic_window(&optimizer, &truth);
        let best = optimizer
            .optimize(&window, &SearchSeeds::default(), BOUNDS, &mut rng(0))
            .unwrap();
        assert_eq!(best.error, 0.0);
    }

    #[test]
    fn window_from_records_uses_preceding_new_cases() {
        let start = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let records: Vec<DailyRecord> = (0..6u64)
            .map(|i| DailyRecord {
                new_cases: i + 1,
                ..DailyRecord::new(start + Days::new(i), 100 + i, 5_000)
            })
            .collect();
        let window = FitmentWindow::from_records(&records[4..], &records[..4], 3, 50.0, Vec::new());
        // new cases 2 + 3 + 4 from the last three preceding records
        assert_eq!(window.initial_active_cases, 9.0);
        assert_eq!(window.actual_new_cases, vec![5.0, 6.0]);
        assert_eq!(window.population, 5_000);

        let standalone = FitmentWindow::from_records(&records[..2], &[], 3, 50.0, Vec::new());
        assert_eq!(standalone.initial_active_cases, 100.0);
    }
}
