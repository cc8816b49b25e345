//! The forward model: a discrete-time epidemic driven by a transmission probability that rises
//! and falls as the sum of two Gaussian surges.
//!
//! For simulated day `t` (day 0 is the first fitment day) the transmission probability is
//!
//! ```text
//! p(t) = β · [g(t; 7·w₁, σ₁) + a · g(t; 7·w₂, σ₂)] · (1 − influence(t))
//! g(t; μ, σ) = exp(−(t − μ)² / 2σ²)
//! ```
//!
//! New infections are `active(t) · p(t)`, capped by the remaining susceptible population, where
//! `active(t)` is the sum of the last `infectious_days` days of infections. Reported cases are the
//! detected share of new infections, capped by the daily testing capacity according to the
//! configured [`ExcessPolicy`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{ExcessPolicy, SimulatorSettings};
use crate::error::ProjectionError;
use crate::numeric::gaussian;

pub const DAYS_PER_WEEK: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondWave {
    /// Weeks from simulation start; never earlier than the first wave's peak.
    pub peak_week: u32,
    /// Standard deviation in days.
    pub spread: f64,
    /// Height relative to the first wave, in `(0, 1]`. No second wave is `None`, never a zero
    /// ratio.
    pub amplitude_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// β, the transmission probability at the first wave's peak.
    pub transmission_probability: f64,
    pub wave1_peak_week: u32,
    /// Standard deviation of the first surge, in days.
    pub wave1_spread: f64,
    /// `None` when there is no second wave.
    pub second_wave: Option<SecondWave>,
}

impl SimulationParameters {
    #[must_use]
    pub fn single_wave(
        transmission_probability: f64,
        wave1_peak_week: u32,
        wave1_spread: f64,
    ) -> Self {
        SimulationParameters {
            transmission_probability,
            wave1_peak_week,
            wave1_spread,
            second_wave: None,
        }
    }

    /// # Errors
    /// `InvalidParameter` naming the first field that breaks its constraint.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        let invalid = |message: String| Err(ProjectionError::InvalidParameter(message));
        if !(self.transmission_probability > 0.0 && self.transmission_probability.is_finite()) {
            return invalid(format!(
                "transmission_probability must be positive, got {}",
                self.transmission_probability
            ));
        }
        if self.wave1_peak_week == 0 {
            return invalid("wave1_peak_week must be at least 1".to_string());
        }
        if !(self.wave1_spread > 0.0 && self.wave1_spread.is_finite()) {
            return invalid(format!("wave1_spread must be positive, got {}", self.wave1_spread));
        }
        if let Some(wave) = &self.second_wave {
            if wave.peak_week < self.wave1_peak_week {
                return invalid(format!(
                    "wave2_peak_week {} precedes wave1_peak_week {}",
                    wave.peak_week, self.wave1_peak_week
                ));
            }
            if !(wave.spread > 0.0 && wave.spread.is_finite()) {
                return invalid(format!("wave2_spread must be positive, got {}", wave.spread));
            }
            if !(wave.amplitude_ratio > 0.0 && wave.amplitude_ratio <= 1.0) {
                return invalid(format!(
                    "wave2_amplitude_ratio must be in (0, 1], got {}",
                    wave.amplitude_ratio
                ));
            }
        }
        Ok(())
    }

    /// The bracketed surge term of `p(t)`, without β or interventions.
    #[must_use]
    pub fn surge_shape(&self, day: f64) -> f64 {
        let first = gaussian(
            day,
            f64::from(self.wave1_peak_week) * DAYS_PER_WEEK,
            self.wave1_spread,
        );
        let second = self.second_wave.map_or(0.0, |wave| {
            wave.amplitude_ratio
                * gaussian(day, f64::from(wave.peak_week) * DAYS_PER_WEEK, wave.spread)
        });
        first + second
    }

    /// `p(t)` for a day with the given intervention influence.
    #[must_use]
    pub fn transmission_probability_at(&self, day: f64, influence: f64) -> f64 {
        self.transmission_probability * self.surge_shape(day) * (1.0 - influence)
    }
}

/// Everything the simulator tracked, one entry per simulated day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationTrace {
    /// True new infections.
    pub infections: Vec<f64>,
    /// Confirmed (reported) new cases; this is what `simulate` returns.
    pub reported: Vec<f64>,
    /// Active pool at the start of the day.
    pub active: Vec<f64>,
    /// Susceptible population at the start of the day.
    pub susceptible: Vec<f64>,
    /// Detected infections still waiting for a test at the end of the day.
    pub backlog: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct EpidemicSimulator {
    settings: SimulatorSettings,
}

impl EpidemicSimulator {
    /// # Errors
    /// `InvalidParameter` if the settings do not validate.
    pub fn new(settings: SimulatorSettings) -> Result<Self, ProjectionError> {
        settings.validate()?;
        Ok(EpidemicSimulator { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }

    /// Daily reported new cases for `day_count` days. `influence` holds the per-day intervention
    /// influence (see [`crate::intervention::influence_series`]); days past its end have none.
    /// `testing_capacity` may be `f64::INFINITY`.
    ///
    /// # Errors
    /// `InvalidParameter` for invalid `params`, a zero population, a negative or NaN testing
    /// capacity or initial active count.
    pub fn simulate(
        &self,
        params: &SimulationParameters,
        initial_active_cases: f64,
        population: u64,
        testing_capacity: f64,
        day_count: usize,
        influence: &[f64],
    ) -> Result<Vec<f64>, ProjectionError> {
        self.simulate_detailed(
            params,
            initial_active_cases,
            population,
            testing_capacity,
            day_count,
            influence,
        )
        .map(|trace| trace.reported)
    }

    /// Like [`EpidemicSimulator::simulate`] but returns the full [`SimulationTrace`].
    ///
    /// # Errors
    /// See [`EpidemicSimulator::simulate`].
    pub fn simulate_detailed(
        &self,
        params: &SimulationParameters,
        initial_active_cases: f64,
        population: u64,
        testing_capacity: f64,
        day_count: usize,
        influence: &[f64],
    ) -> Result<SimulationTrace, ProjectionError> {
        params.validate()?;
        if population == 0 {
            return Err(ProjectionError::InvalidParameter(
                "population must be positive".to_string(),
            ));
        }
        if testing_capacity.is_nan() || testing_capacity < 0.0 {
            return Err(ProjectionError::InvalidParameter(format!(
                "testing capacity must be non-negative, got {testing_capacity}"
            )));
        }
        if !(initial_active_cases >= 0.0 && initial_active_cases.is_finite()) {
            return Err(ProjectionError::InvalidParameter(format!(
                "initial active cases must be non-negative, got {initial_active_cases}"
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let population = population as f64;
        let infectious_days = self.settings.infectious_days;
        #[allow(clippy::cast_precision_loss)]
        let seed_per_day = initial_active_cases / infectious_days as f64;
        let mut pool: VecDeque<f64> =
            std::iter::repeat(seed_per_day).take(infectious_days).collect();
        let mut cumulative_infected = initial_active_cases.min(population);
        let mut backlog = 0.0;

        let mut trace = SimulationTrace {
            infections: Vec::with_capacity(day_count),
            reported: Vec::with_capacity(day_count),
            active: Vec::with_capacity(day_count),
            susceptible: Vec::with_capacity(day_count),
            backlog: Vec::with_capacity(day_count),
        };

        for day in 0..day_count {
            let active: f64 = pool.iter().sum();
            let susceptible = (population - cumulative_infected).max(0.0);
            let day_influence = influence.get(day).copied().unwrap_or(0.0).clamp(0.0, 1.0);
            #[allow(clippy::cast_precision_loss)]
            let p = params.transmission_probability_at(day as f64, day_influence);

            let new_infections = (active * p).min(susceptible).max(0.0);
            pool.pop_front();
            pool.push_back(new_infections);
            cumulative_infected += new_infections;

            let detected = new_infections * self.settings.detection_rate;
            let reported = match self.settings.excess_policy {
                ExcessPolicy::Drop => detected.min(testing_capacity),
                ExcessPolicy::Defer => {
                    let waiting = detected + backlog;
                    let tested = waiting.min(testing_capacity);
                    backlog = waiting - tested;
                    tested
                }
            };

            trace.infections.push(new_infections);
            trace.reported.push(reported);
            trace.active.push(active);
            trace.susceptible.push(susceptible);
            trace.backlog.push(backlog);
        }

        Ok(trace)
    }
}
