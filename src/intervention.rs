//! Turns intervention-stringency scores into the per-day dampening applied to the transmission
//! probability: `p(t) *= 1 - influence(t)`.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::data::DailyRecord;

/// Maps each day's stringency score in `[0, 1]` to an influence in `[0, ceiling]`. Missing (or
/// NaN) scores mean no influence. Out-of-range scores and ceilings are clamped into `[0, 1]`.
#[must_use]
pub fn influence_series(intervention_scores: &[Option<f64>], ceiling: f64) -> Vec<f64> {
    let ceiling = if ceiling.is_nan() { 0.0 } else { ceiling.clamp(0.0, 1.0) };
    intervention_scores
        .iter()
        .map(|score| match score {
            Some(score) if !score.is_nan() => score.clamp(0.0, 1.0) * ceiling,
            _ => 0.0,
        })
        .collect()
}

/// Picks each record's score, preferring the provider's `(date, score)` series over the score
/// already carried by the record.
#[must_use]
pub fn align_scores(
    records: &[DailyRecord],
    provider_series: &[(NaiveDate, f64)],
) -> Vec<Option<f64>> {
    let by_date: FxHashMap<NaiveDate, f64> = provider_series.iter().copied().collect();
    records
        .iter()
        .map(|record| {
            by_date
                .get(&record.date)
                .copied()
                .or(record.intervention_score)
        })
        .collect()
}

/// Extends `influence` to `len` days by holding its last value; policies in force at the end of
/// the data are assumed to persist. An empty series stays at zero influence.
#[must_use]
pub fn extend_forward(mut influence: Vec<f64>, len: usize) -> Vec<f64> {
    let last = influence.last().copied().unwrap_or(0.0);
    if influence.len() < len {
        influence.resize(len, last);
    }
    influence
}
