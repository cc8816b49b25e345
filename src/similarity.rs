//! Finds historical regions whose epidemic grew the way the target region is growing now, and
//! reads off how many weeks those regions still had to go before their peak.
//!
//! Curves are compared through their daily log growth rates, `ln(s[t+1] / s[t])` of the
//! smoothed new-case series `s`, which makes regions of very different size comparable. Each
//! historical region is only searched inside its rising phase (first reported case up to its
//! peak), and the best-matching window position is kept per region.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::data::RegionTimeSeries;
use crate::log::{debug, trace};
use crate::simulator::DAYS_PER_WEEK;

// Smoothed values below half a case are treated as half a case so growth stays finite.
const GROWTH_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateWindow {
    pub source_region: String,
    /// Weeks from the start of the matched window to the source region's peak.
    pub weeks_to_peak: u32,
    /// Mean daily growth rate over the matched window (0.05 = 5% a day).
    pub matched_rate: f64,
    /// `1 / (1 + distance)`, in `(0, 1]`.
    pub similarity_score: f64,
    /// RMS difference of log growth rates; lower is more similar.
    pub distance: f64,
    /// Cumulative confirmed cases of the source region.
    pub source_cases: u64,
}

/// Trailing moving average; the first `window - 1` days average over what is available.
#[must_use]
pub fn smoothed(new_cases: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut running = 0.0;
    let mut out = Vec::with_capacity(new_cases.len());
    for (i, value) in new_cases.iter().enumerate() {
        running += value;
        if i >= window {
            running -= new_cases[i - window];
        }
        #[allow(clippy::cast_precision_loss)]
        out.push(running / (i + 1).min(window) as f64);
    }
    out
}

/// Log growth between consecutive smoothed days. Entry `j` is the growth from day `j` to day
/// `j + 1`, so the result is one shorter than the input.
#[must_use]
pub fn log_growth(smoothed: &[f64]) -> Vec<f64> {
    smoothed
        .windows(2)
        .map(|pair| (pair[1].max(GROWTH_FLOOR) / pair[0].max(GROWTH_FLOOR)).ln())
        .collect()
}

/// Smooths `new_cases` and returns its log growth series.
#[must_use]
pub fn growth_series(new_cases: &[f64], smoothing_days: usize) -> Vec<f64> {
    log_growth(&smoothed(new_cases, smoothing_days))
}

/// The parts of a historical region's curve the matcher needs.
#[derive(Debug, Clone)]
pub struct GrowthProfile {
    pub region: String,
    pub growth: Vec<f64>,
    /// Day of the highest smoothed value (first one on ties).
    pub peak_day: usize,
    pub peak_cases: f64,
    /// First day with a positive smoothed value.
    pub first_case_day: Option<usize>,
    pub total_cases: u64,
}

impl GrowthProfile {
    #[must_use]
    pub fn from_series(series: &RegionTimeSeries, smoothing_days: usize) -> Self {
        let smooth = smoothed(&series.new_cases(), smoothing_days);
        let mut peak_day = 0;
        let mut peak_cases = f64::NEG_INFINITY;
        for (day, value) in smooth.iter().enumerate() {
            if *value > peak_cases {
                peak_day = day;
                peak_cases = *value;
            }
        }
        GrowthProfile {
            region: series.region().to_string(),
            growth: log_growth(&smooth),
            peak_day,
            peak_cases: peak_cases.max(0.0),
            first_case_day: smooth.iter().position(|v| *v > 0.0),
            total_cases: series.total_confirmed(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurveSimilarityMatcher {
    config: MatcherConfig,
}

impl CurveSimilarityMatcher {
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        CurveSimilarityMatcher { config }
    }

    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Ranks `corpus` by similarity to `target_growth`, most similar first, keeping at most
    /// `top_k` windows. Regions named `exclude_region` are skipped. An empty corpus (or an empty
    /// target) yields an empty result.
    #[must_use]
    pub fn find_candidates(
        &self,
        target_growth: &[f64],
        corpus: &BTreeMap<String, RegionTimeSeries>,
        exclude_region: Option<&str>,
    ) -> Vec<CandidateWindow> {
        let profiles: Vec<GrowthProfile> = corpus
            .values()
            .filter(|series| Some(series.region()) != exclude_region)
            .map(|series| GrowthProfile::from_series(series, self.config.smoothing_days))
            .collect();
        self.rank_profiles(target_growth, &profiles)
    }

    /// Like [`CurveSimilarityMatcher::find_candidates`] over precomputed profiles.
    #[must_use]
    pub fn rank_profiles(
        &self,
        target_growth: &[f64],
        profiles: &[GrowthProfile],
    ) -> Vec<CandidateWindow> {
        if target_growth.is_empty() || self.config.top_k == 0 {
            return Vec::new();
        }
        let mut candidates: Vec<CandidateWindow> = profiles
            .par_iter()
            .filter_map(|profile| self.best_window(target_growth, profile))
            .collect();
        candidates.sort_by(compare_candidates);
        candidates.truncate(self.config.top_k);
        candidates
    }

    fn best_window(&self, target: &[f64], profile: &GrowthProfile) -> Option<CandidateWindow> {
        if profile.peak_cases < self.config.min_peak_cases {
            debug!(
                "skipping {}: peak of {:.1} cases is below {}",
                profile.region, profile.peak_cases, self.config.min_peak_cases
            );
            return None;
        }
        let width = target.len();
        let first = profile.first_case_day?;
        // Windows must end by the peak: growth entry j covers day j to day j + 1.
        if profile.peak_day < first + width {
            debug!(
                "skipping {}: rising phase of {} days is shorter than {width}",
                profile.region,
                profile.peak_day.saturating_sub(first)
            );
            return None;
        }

        let (distance, start) = (first..=profile.peak_day - width)
            .map(|start| (rms_distance(target, &profile.growth[start..start + width]), start))
            .min_by(|a, b| a.0.total_cmp(&b.0))?;

        #[allow(clippy::cast_precision_loss)]
        let mean_growth = profile.growth[start..start + width].iter().sum::<f64>() / width as f64;
        #[allow(clippy::cast_precision_loss)]
        let weeks = ((profile.peak_day - start) as f64 / DAYS_PER_WEEK).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let weeks_to_peak = (weeks as u32).max(1);

        trace!(
            "{}: best window starts on day {start}, distance {distance:.4}, \
             peak in {weeks_to_peak} weeks",
            profile.region
        );
        Some(CandidateWindow {
            source_region: profile.region.clone(),
            weeks_to_peak,
            matched_rate: mean_growth.exp() - 1.0,
            similarity_score: 1.0 / (1.0 + distance),
            distance,
            source_cases: profile.total_cases,
        })
    }
}

fn rms_distance(a: &[f64], b: &[f64]) -> f64 {
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    #[allow(clippy::cast_precision_loss)]
    (squared / a.len() as f64).sqrt()
}

// Ascending distance; ties go to the region with more cases, then by name.
fn compare_candidates(a: &CandidateWindow, b: &CandidateWindow) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| b.source_cases.cmp(&a.source_cases))
        .then_with(|| a.source_region.cmp(&b.source_region))
}
