//! Floating point helpers shared by the simulator, the matcher and the optimizer: tolerant
//! comparison (over the `approx` crate), the unnormalized Gaussian surge kernel and the
//! scale-aware error metrics used to score a simulated curve against observed cases.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

/// Targeted accuracy instantiated over `f64`
pub const ACC: f64 = 10e-11;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// `exp(-(t - mu)^2 / (2 sigma^2))`. Peaks at exactly 1 when `t == mu`.
#[must_use]
pub fn gaussian(t: f64, mu: f64, sigma: f64) -> f64 {
    let z = (t - mu) / sigma;
    (-0.5 * z * z).exp()
}

/// The distance used to compare a simulated daily series with observed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMetric {
    /// Mean absolute percentage error. Observed values below 1 are treated as 1.
    #[default]
    Mape,
    /// Root mean squared error divided by the mean observed value.
    Nrmse,
}

impl ErrorMetric {
    /// Scores `simulated` against `actual` over their common prefix. Returns `f64::NAN` for
    /// empty input or when `simulated` holds non-finite values, so callers can reject the
    /// candidate with `is_finite`.
    #[must_use]
    pub fn score(self, simulated: &[f64], actual: &[f64]) -> f64 {
        let n = simulated.len().min(actual.len());
        if n == 0 {
            return f64::NAN;
        }
        let pairs = simulated.iter().zip(actual).take(n);
        #[allow(clippy::cast_precision_loss)]
        let n = n as f64;
        match self {
            ErrorMetric::Mape => {
                pairs
                    .map(|(s, a)| (s - a).abs() / a.max(1.0))
                    .sum::<f64>()
                    / n
            }
            ErrorMetric::Nrmse => {
                let mut squared = 0.0;
                let mut total = 0.0;
                for (s, a) in pairs {
                    squared += (s - a) * (s - a);
                    total += a;
                }
                let mean = (total / n).max(1.0);
                (squared / n).sqrt() / mean
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    #[test]
    fn almost_eq_within_tolerance() {
        let a = 1.0;
        let b = 1.0 + 0.5e-11;
        assert!(almost_eq(a, b, ACC));
        assert!(!almost_eq(a, 1.0 + 2e-10, ACC));
    }

    #[test]
    fn almost_eq_infinities() {
        assert!(almost_eq(f64::INFINITY, f64::INFINITY, ACC));
        assert!(!almost_eq(f64::INFINITY, f64::NEG_INFINITY, ACC));
    }

    #[test]
    fn gaussian_peaks_at_mean() {
        assert_almost_eq!(gaussian(21.0, 21.0, 7.0), 1.0, ACC);
        assert_almost_eq!(gaussian(28.0, 21.0, 7.0), (-0.5f64).exp(), ACC);
        assert!(gaussian(0.0, 21.0, 7.0) < gaussian(14.0, 21.0, 7.0));
    }

    #[test]
    fn mape_of_identical_series_is_zero() {
        let series = [3.0, 5.0, 8.0];
        assert_almost_eq!(ErrorMetric::Mape.score(&series, &series), 0.0, ACC);
        assert_almost_eq!(ErrorMetric::Nrmse.score(&series, &series), 0.0, ACC);
    }

    #[test]
    fn mape_floors_small_denominators() {
        // |2 - 0| / max(0, 1) = 2 and |10 - 5| / 5 = 1
        assert_almost_eq!(ErrorMetric::Mape.score(&[2.0, 10.0], &[0.0, 5.0]), 1.5, ACC);
    }

    #[test]
    fn nrmse_scales_by_mean() {
        // rmse = sqrt((4 + 4) / 2) = 2, mean = 10
        assert_almost_eq!(
            ErrorMetric::Nrmse.score(&[8.0, 12.0], &[10.0, 10.0]),
            0.2,
            1e-12
        );
    }

    #[test]
    fn empty_and_nan_inputs_are_not_finite() {
        assert!(ErrorMetric::Mape.score(&[], &[]).is_nan());
        assert!(!ErrorMetric::Mape.score(&[f64::NAN], &[1.0]).is_finite());
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn assert_almost_eq_macro_panics() {
        assert_almost_eq!(1.0, 1.001, 1e-4);
    }
}
