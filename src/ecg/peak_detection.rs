use serde::{Deserialize, Serialize};

use crate::ecg::stats;
use crate::models::ecg::RawSample;

/// Fewer samples than this yield no peaks.
pub const MIN_PEAK_SAMPLES: usize = 10;
/// Shortest plausible beat-to-beat gap, in seconds.
pub const REFRACTORY_PERIOD_SECS: f64 = 0.25;
/// Multiplier used by the fixed threshold variant.
pub const FIXED_THRESHOLD_MULTIPLIER: f64 = 0.8;

/// How the amplitude threshold for R-peak candidates is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStrategy {
    /// `mean + k * std_dev` where `k` is picked from the IQR / std-dev ratio.
    #[default]
    Adaptive,
    /// `mean + 0.8 * std_dev`, for sensors with normalized amplitude units.
    Fixed,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    value: f64,
    timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    sampling_rate_hz: f64,
    strategy: ThresholdStrategy,
}

impl PeakDetector {
    pub fn new(sampling_rate_hz: f64, strategy: ThresholdStrategy) -> Self {
        Self {
            sampling_rate_hz,
            strategy,
        }
    }

    /// Refractory period in samples, never below one.
    pub fn refractory_samples(&self) -> usize {
        let samples = (REFRACTORY_PERIOD_SECS * self.sampling_rate_hz).round();
        if samples.is_finite() && samples >= 1.0 {
            samples as usize
        } else {
            1
        }
    }

    /// Amplitude a candidate has to exceed. `None` for a flat signal.
    pub fn threshold(&self, values: &[f64]) -> Option<f64> {
        let mean = stats::mean(values);
        let std_dev = stats::std_dev(values);
        if std_dev <= 0.0 || !std_dev.is_finite() {
            return None;
        }

        let multiplier = match self.strategy {
            ThresholdStrategy::Fixed => FIXED_THRESHOLD_MULTIPLIER,
            ThresholdStrategy::Adaptive => {
                let sorted = stats::sorted(values);
                let iqr = stats::quantile(&sorted, 0.75) - stats::quantile(&sorted, 0.25);
                let snr = iqr / std_dev;
                tracing::debug!("Signal stats - mean: {:.2}, std_dev: {:.2}, snr: {:.2}", mean, std_dev, snr);
                if snr < 1.5 {
                    2.5
                } else if snr < 2.5 {
                    2.0
                } else {
                    1.5
                }
            }
        };

        Some(mean + multiplier * std_dev)
    }

    /// Timestamps of detected R-peaks, strictly increasing.
    pub fn detect(&self, samples: &[RawSample]) -> Vec<i64> {
        if samples.len() < MIN_PEAK_SAMPLES {
            return Vec::new();
        }

        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let Some(threshold) = self.threshold(&values) else {
            return Vec::new();
        };

        let candidates = local_maxima(samples, threshold);
        let refractory = self.refractory_samples();

        let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match accepted.last_mut() {
                None => accepted.push(candidate),
                Some(last) if candidate.index - last.index >= refractory => accepted.push(candidate),
                // Too close: keep whichever of the two is taller
                Some(last) if candidate.value > last.value => *last = candidate,
                Some(_) => {}
            }
        }

        let mut peaks: Vec<i64> = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            match peaks.last() {
                Some(&previous) if candidate.timestamp <= previous => {
                    tracing::debug!("Skipping peak with non-increasing timestamp {}", candidate.timestamp);
                }
                _ => peaks.push(candidate.timestamp),
            }
        }

        tracing::debug!("Found {} R-peaks in {} samples (threshold {:.2})", peaks.len(), samples.len(), threshold);
        peaks
    }
}

/// Samples strictly above their two left neighbours, at least equal to their two right
/// neighbours, and above `threshold`.
fn local_maxima(samples: &[RawSample], threshold: f64) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for i in 2..samples.len().saturating_sub(2) {
        let value = samples[i].value;
        let is_peak = value > samples[i - 2].value
            && value > samples[i - 1].value
            && value >= samples[i + 1].value
            && value >= samples[i + 2].value;
        if is_peak && value > threshold {
            candidates.push(Candidate {
                index: i,
                value,
                timestamp: samples[i].timestamp,
            });
        }
    }
    candidates
}

/// Adaptive R-peak detection at the given sampling rate.
pub fn detect_peaks(samples: &[RawSample], sampling_rate_hz: f64) -> Vec<i64> {
    PeakDetector::new(sampling_rate_hz, ThresholdStrategy::Adaptive).detect(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_with_spikes(len: usize, spikes: &[(usize, f64)]) -> Vec<RawSample> {
        let mut samples: Vec<RawSample> = (0..len)
            .map(|i| RawSample {
                timestamp: (i as f64 * 1000.0 / 130.0).round() as i64,
                value: if i % 2 == 0 { 1.0 } else { -1.0 },
            })
            .collect();
        for &(index, value) in spikes {
            samples[index].value = value;
        }
        samples
    }

    #[test]
    fn too_few_samples_yield_no_peaks() {
        let samples = flat_with_spikes(9, &[(4, 100.0)]);
        assert!(detect_peaks(&samples, 130.0).is_empty());
    }

    #[test]
    fn flat_signal_has_no_peaks() {
        let samples: Vec<RawSample> = (0..200)
            .map(|i| RawSample { timestamp: i * 8, value: 5.0 })
            .collect();
        assert!(detect_peaks(&samples, 130.0).is_empty());
    }

    #[test]
    fn refractory_period_is_rounded_quarter_second() {
        assert_eq!(PeakDetector::new(130.0, ThresholdStrategy::Adaptive).refractory_samples(), 33);
        assert_eq!(PeakDetector::new(250.0, ThresholdStrategy::Fixed).refractory_samples(), 63);
        assert_eq!(PeakDetector::new(0.0, ThresholdStrategy::Fixed).refractory_samples(), 1);
    }

    #[test]
    fn isolated_spikes_are_detected() {
        let samples = flat_with_spikes(400, &[(50, 100.0), (160, 100.0), (270, 100.0)]);
        let peaks = detect_peaks(&samples, 130.0);
        assert_eq!(peaks, vec![samples[50].timestamp, samples[160].timestamp, samples[270].timestamp]);
    }

    #[test]
    fn close_spikes_keep_the_taller_one() {
        let samples = flat_with_spikes(400, &[(50, 80.0), (60, 120.0), (200, 100.0)]);
        let peaks = detect_peaks(&samples, 130.0);
        assert_eq!(peaks, vec![samples[60].timestamp, samples[200].timestamp]);
    }

    #[test]
    fn close_smaller_spike_is_ignored() {
        let samples = flat_with_spikes(400, &[(50, 120.0), (60, 80.0), (200, 100.0)]);
        let peaks = detect_peaks(&samples, 130.0);
        assert_eq!(peaks, vec![samples[50].timestamp, samples[200].timestamp]);
    }

    #[test]
    fn fixed_threshold_variant_respects_refractory_period() {
        let samples = flat_with_spikes(400, &[(50, 10.0), (70, 11.0), (90, 10.0), (300, 10.0)]);
        let detector = PeakDetector::new(130.0, ThresholdStrategy::Fixed);
        let peaks = detector.detect(&samples);
        let refractory_ms = (detector.refractory_samples() as f64 * 1000.0 / 130.0) as i64;
        assert!(peaks.windows(2).all(|w| w[1] - w[0] >= refractory_ms));
        assert!(peaks.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn detection_is_idempotent() {
        let samples = flat_with_spikes(400, &[(50, 100.0), (160, 90.0), (270, 110.0)]);
        assert_eq!(detect_peaks(&samples, 130.0), detect_peaks(&samples, 130.0));
    }
}
