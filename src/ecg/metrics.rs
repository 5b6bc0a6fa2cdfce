use serde::{Deserialize, Serialize};

use crate::ecg::peak_detection::{PeakDetector, ThresholdStrategy};
use crate::ecg::rr_intervals::{instantaneous_rates, rmssd, rr_intervals};
use crate::ecg::stats::{self, round_to_i32};
use crate::models::ecg::{EcgMetrics, HeartRateSample, RawSample};

pub const MIN_ECG_SAMPLES: usize = 50;
pub const MIN_RR_INTERVALS: usize = 5;
pub const HRV_WINDOW_SIZE: usize = 8;

/// Where avg/median/min/max heart rate come from. Applied uniformly to every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateSource {
    /// The strap's reported heart rate stream.
    #[default]
    ReportedStream,
    /// Rates implied by the detected RR intervals.
    RrIntervals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    pub sampling_rate_hz: f64,
    pub threshold: ThresholdStrategy,
    pub hrv_window_size: usize,
    pub min_rr_intervals: usize,
    pub min_ecg_samples: usize,
    pub heart_rate_source: HeartRateSource,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 130.0,
            threshold: ThresholdStrategy::Adaptive,
            hrv_window_size: HRV_WINDOW_SIZE,
            min_rr_intervals: MIN_RR_INTERVALS,
            min_ecg_samples: MIN_ECG_SAMPLES,
            heart_rate_source: HeartRateSource::ReportedStream,
        }
    }
}

/// Metrics for one closed segment, computed from scratch on every call.
///
/// Fewer than `min_ecg_samples` ECG points produce zeroed metrics. Rates are rounded to
/// whole bpm and HRV to whole ms.
pub fn compute_metrics(ecg: &[RawSample], hr: &[HeartRateSample], config: &MetricsConfig) -> EcgMetrics {
    if ecg.len() < config.min_ecg_samples {
        tracing::debug!("Not enough ECG data for metrics: {} samples", ecg.len());
        return EcgMetrics::empty();
    }

    let detector = PeakDetector::new(config.sampling_rate_hz, config.threshold);
    let r_peaks = detector.detect(ecg);
    let rr = rr_intervals(&r_peaks);
    let hrv = round_to_i32(rmssd(&rr, config.hrv_window_size, config.min_rr_intervals));

    let mut metrics = match config.heart_rate_source {
        HeartRateSource::ReportedStream => reported_rate_metrics(hr),
        HeartRateSource::RrIntervals => rr_rate_metrics(&rr, &r_peaks, ecg),
    };
    metrics.heart_rate_variability = hrv;
    metrics.rr_intervals = rr;
    metrics.r_peaks = r_peaks;
    metrics
}

fn reported_rate_metrics(hr: &[HeartRateSample]) -> EcgMetrics {
    let (Some(first), Some(last)) = (hr.first(), hr.last()) else {
        return EcgMetrics::empty();
    };

    let values: Vec<f64> = hr.iter().map(|s| s.value as f64).collect();
    let avg = stats::mean(&values);
    let duration = (last.timestamp - first.timestamp).max(0);
    let duration_minutes = duration as f64 / 60_000.0;

    EcgMetrics {
        avg_heart_rate: round_to_i32(avg),
        median_heart_rate: round_to_i32(stats::median(&values)),
        min_heart_rate: hr.iter().map(|s| s.value).min().unwrap_or(0),
        max_heart_rate: hr.iter().map(|s| s.value).max().unwrap_or(0),
        total_beats: (avg * duration_minutes).round() as i64,
        duration,
        ..EcgMetrics::empty()
    }
}

fn rr_rate_metrics(rr: &[i64], r_peaks: &[i64], ecg: &[RawSample]) -> EcgMetrics {
    let rates = instantaneous_rates(rr);
    let duration = match (ecg.first(), ecg.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).max(0),
        _ => 0,
    };

    let min = rates.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = rates.iter().copied().reduce(f64::max).unwrap_or(0.0);

    EcgMetrics {
        avg_heart_rate: round_to_i32(stats::mean(&rates)),
        median_heart_rate: round_to_i32(stats::median(&rates)),
        min_heart_rate: round_to_i32(min),
        max_heart_rate: round_to_i32(max),
        total_beats: r_peaks.len() as i64,
        duration,
        ..EcgMetrics::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 130 Hz samples with a sharp spike every `rr_ms`.
    fn spiky_ecg(duration_ms: i64, rr_ms: i64) -> Vec<RawSample> {
        let count = (duration_ms as f64 * 130.0 / 1000.0) as usize;
        let step = 1000.0 / 130.0;
        let mut samples: Vec<RawSample> = (0..count)
            .map(|i| RawSample {
                timestamp: (i as f64 * step).round() as i64,
                value: if i % 2 == 0 { 2.0 } else { -2.0 },
            })
            .collect();
        let mut beat = rr_ms / 2;
        while beat < duration_ms {
            let index = (beat as f64 / step).round() as usize;
            if index + 2 < samples.len() && index >= 2 {
                samples[index].value = 500.0;
            }
            beat += rr_ms;
        }
        samples
    }

    fn hr_stream(start: i64, seconds: i64, bpm: i32) -> Vec<HeartRateSample> {
        (0..seconds)
            .map(|i| HeartRateSample { timestamp: start + i * 1000, value: bpm })
            .collect()
    }

    #[test]
    fn short_slices_produce_zeroed_metrics() {
        let ecg = spiky_ecg(300, 800);
        assert!(ecg.len() < MIN_ECG_SAMPLES);
        let metrics = compute_metrics(&ecg, &hr_stream(0, 10, 70), &MetricsConfig::default());
        assert_eq!(metrics, EcgMetrics::empty());
    }

    #[test]
    fn reported_stream_drives_rate_statistics() {
        let ecg = spiky_ecg(10_000, 800);
        let mut hr = hr_stream(0, 61, 70);
        hr[10].value = 90;
        hr[20].value = 60;
        let metrics = compute_metrics(&ecg, &hr, &MetricsConfig::default());

        assert_eq!(metrics.min_heart_rate, 60);
        assert_eq!(metrics.max_heart_rate, 90);
        assert_eq!(metrics.median_heart_rate, 70);
        assert_eq!(metrics.avg_heart_rate, 70);
        assert_eq!(metrics.duration, 60_000);
        assert_eq!(metrics.total_beats, 70);
        assert!(!metrics.r_peaks.is_empty());
    }

    #[test]
    fn rr_interval_source_derives_rates_from_peaks() {
        let ecg = spiky_ecg(10_000, 800);
        let config = MetricsConfig {
            heart_rate_source: HeartRateSource::RrIntervals,
            ..MetricsConfig::default()
        };
        let metrics = compute_metrics(&ecg, &[], &config);

        assert!((metrics.avg_heart_rate - 75).abs() <= 1);
        assert_eq!(metrics.total_beats, metrics.r_peaks.len() as i64);
        assert!(metrics.rr_intervals.iter().all(|&rr| (790..=810).contains(&rr)));
        assert!(metrics.heart_rate_variability >= 0);
    }

    #[test]
    fn missing_heart_rate_stream_leaves_rates_zero() {
        let ecg = spiky_ecg(10_000, 800);
        let metrics = compute_metrics(&ecg, &[], &MetricsConfig::default());
        assert_eq!(metrics.avg_heart_rate, 0);
        assert_eq!(metrics.duration, 0);
        assert!(!metrics.rr_intervals.is_empty());
    }

    #[test]
    fn metrics_are_idempotent() {
        let ecg = spiky_ecg(10_000, 750);
        let hr = hr_stream(0, 10, 80);
        let config = MetricsConfig::default();
        assert_eq!(compute_metrics(&ecg, &hr, &config), compute_metrics(&ecg, &hr, &config));
    }
}
