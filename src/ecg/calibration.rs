use serde::{Deserialize, Serialize};

use crate::ecg::stats;
use crate::models::ecg::RawSample;

/// Amplitude statistics of a calibration recording taken at rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMetrics {
    pub mean: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl BaseMetrics {
    pub fn from_samples(samples: &[RawSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let variance = stats::variance(&values);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        Some(Self {
            mean: stats::mean(&values),
            variance,
            standard_deviation: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPeriod {
    pub start: i64,
    pub end: i64,
}

/// Bounds for both the window length and the step.
pub const MIN_WINDOW_MS: i64 = 1_000;
pub const MAX_WINDOW_MS: i64 = 3_600_000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PredictionError {
    #[error("window_ms {0} outside 1000..=3600000")]
    WindowOutOfRange(i64),

    #[error("step_ms {0} outside 1000..=3600000")]
    StepOutOfRange(i64),

    #[error("similarity_threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionOptions {
    pub window_ms: i64,
    pub step_ms: i64,
    /// Allowed relative difference in mean and variance, e.g. 0.1 for 10 %.
    pub similarity_threshold: f64,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self {
            window_ms: 30_000,
            step_ms: 10_000,
            similarity_threshold: 0.1,
        }
    }
}

impl PredictionOptions {
    pub fn validate(&self) -> Result<(), PredictionError> {
        let range = MIN_WINDOW_MS..=MAX_WINDOW_MS;
        if !range.contains(&self.window_ms) {
            return Err(PredictionError::WindowOutOfRange(self.window_ms));
        }
        if !range.contains(&self.step_ms) {
            return Err(PredictionError::StepOutOfRange(self.step_ms));
        }
        if !(self.similarity_threshold.is_finite() && self.similarity_threshold >= 0.0) {
            return Err(PredictionError::InvalidThreshold(self.similarity_threshold));
        }
        Ok(())
    }
}

fn relative_difference(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some((value - baseline).abs() / baseline.abs())
}

fn resembles_baseline(window: &[f64], base: &BaseMetrics, threshold: f64) -> bool {
    let mean_diff = relative_difference(stats::mean(window), base.mean);
    let variance_diff = relative_difference(stats::variance(window), base.variance);
    matches!(
        (mean_diff, variance_diff),
        (Some(mean), Some(variance)) if mean <= threshold && variance <= threshold
    )
}

/// Stretches of the recording whose amplitude statistics look like the calibration
/// baseline again. Windows slide by `step_ms`; consecutive matching windows merge into
/// one period.
///
/// `samples` must be sorted by timestamp.
pub fn predict_recovery_periods(
    samples: &[RawSample],
    base: &BaseMetrics,
    options: &PredictionOptions,
) -> Vec<RecoveryPeriod> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    if options.window_ms <= 0 || options.step_ms <= 0 {
        return Vec::new();
    }

    let mut periods = Vec::new();
    let mut current: Option<RecoveryPeriod> = None;
    let mut window_start = first.timestamp;

    while let Some(window_end) = window_start.checked_add(options.window_ms) {
        if window_end > last.timestamp {
            break;
        }
        let lo = samples.partition_point(|s| s.timestamp < window_start);
        let hi = samples.partition_point(|s| s.timestamp < window_end);
        let window: Vec<f64> = samples[lo..hi.max(lo)].iter().map(|s| s.value).collect();

        if !window.is_empty() {
            if resembles_baseline(&window, base, options.similarity_threshold) {
                match current.as_mut() {
                    Some(period) => period.end = window_end,
                    None => {
                        current = Some(RecoveryPeriod {
                            start: window_start,
                            end: window_end,
                        })
                    }
                }
            } else if let Some(period) = current.take() {
                periods.push(period);
            }
        }

        match window_start.checked_add(options.step_ms) {
            Some(next) => window_start = next,
            None => break,
        }
    }

    if let Some(period) = current {
        periods.push(period);
    }
    periods
}
