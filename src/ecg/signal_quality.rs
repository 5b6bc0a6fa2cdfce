//! Signal quality scoring.
//!
//! The canonical scorer tiers a window of raw samples by its standard deviation. A
//! feature-based classifier can be plugged in behind the same [`SignalQualityScorer`]
//! trait; it falls back to the dispersion scorer whenever it cannot produce a rating.

use serde::{Deserialize, Serialize};

use crate::ecg::stats;
use crate::models::ecg::{RawSample, SignalQualityRating};

pub trait SignalQualityScorer: Send + Sync {
    fn score(&self, samples: &[RawSample]) -> SignalQualityRating;
}

/// Calibration constants for the sensor's amplitude units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Raw integer units of the chest strap: 300 / 400 / 500.
    #[default]
    SensorRaw,
    /// Same cutoffs without the `fair` tier.
    SensorRawThreeTier,
    /// Normalized amplitudes: 0.1 / 0.2 / 0.5.
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub excellent: f64,
    pub good: f64,
    /// `None` drops the `fair` tier.
    pub fair: Option<f64>,
}

impl From<QualityPreset> for QualityThresholds {
    fn from(preset: QualityPreset) -> Self {
        match preset {
            QualityPreset::SensorRaw => QualityThresholds { excellent: 300.0, good: 400.0, fair: Some(500.0) },
            QualityPreset::SensorRawThreeTier => QualityThresholds { excellent: 300.0, good: 400.0, fair: None },
            QualityPreset::Normalized => QualityThresholds { excellent: 0.1, good: 0.2, fair: Some(0.5) },
        }
    }
}

impl QualityThresholds {
    pub fn rate(&self, std_dev: f64) -> SignalQualityRating {
        if std_dev < self.excellent {
            SignalQualityRating::Excellent
        } else if std_dev < self.good {
            SignalQualityRating::Good
        } else if self.fair.is_some_and(|fair| std_dev < fair) {
            SignalQualityRating::Fair
        } else {
            SignalQualityRating::Poor
        }
    }
}

/// Tiers samples by population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionScorer {
    thresholds: QualityThresholds,
    /// Only the most recent N samples are considered when set.
    recent_samples: Option<usize>,
}

impl DispersionScorer {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds, recent_samples: None }
    }

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self::new(preset.into())
    }

    pub fn with_recent_window(mut self, seconds: f64, sampling_rate_hz: f64) -> Self {
        let samples = (seconds * sampling_rate_hz).round();
        self.recent_samples = (samples.is_finite() && samples >= 1.0).then_some(samples as usize);
        self
    }

    pub fn recent_samples(&self) -> Option<usize> {
        self.recent_samples
    }

    pub fn std_dev(&self, samples: &[RawSample]) -> f64 {
        let window = match self.recent_samples {
            Some(n) if samples.len() > n => &samples[samples.len() - n..],
            _ => samples,
        };
        let values: Vec<f64> = window.iter().map(|s| s.value).collect();
        stats::std_dev(&values)
    }
}

impl Default for DispersionScorer {
    fn default() -> Self {
        Self::from_preset(QualityPreset::SensorRaw)
    }
}

impl SignalQualityScorer for DispersionScorer {
    fn score(&self, samples: &[RawSample]) -> SignalQualityRating {
        if samples.is_empty() {
            return SignalQualityRating::Poor;
        }
        self.thresholds.rate(self.std_dev(samples))
    }
}

/// Dispersion-based quality with the raw sensor cutoffs.
pub fn score_quality(samples: &[RawSample]) -> SignalQualityRating {
    DispersionScorer::default().score(samples)
}

/// Statistical features fed to a quality classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityFeatures {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub range: f64,
    pub zero_crossings: f64,
    pub rms: f64,
    pub snr: f64,
    pub peak_count: f64,
    pub avg_peak_height: f64,
    pub peak_variability: f64,
    pub avg_inter_peak_interval: f64,
    pub std_inter_peak_interval: f64,
}

impl QualityFeatures {
    pub const LEN: usize = 13;

    /// `None` for empty or perfectly flat input, where the higher moments are undefined.
    pub fn extract(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = stats::mean(values);
        let std_dev = stats::std_dev(values);
        if std_dev <= 0.0 {
            return None;
        }

        let skewness = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / (std_dev.powi(3) * n);
        let kurtosis = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / (std_dev.powi(4) * n);
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        let zero_crossings = values
            .windows(2)
            .filter(|pair| pair[0].signum() != pair[1].signum())
            .count() as f64;
        let rms = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();

        let peaks: Vec<usize> = (1..values.len().saturating_sub(1))
            .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1] && values[i] > mean)
            .collect();
        let heights: Vec<f64> = peaks.iter().map(|&i| values[i]).collect();
        let intervals: Vec<f64> = peaks.windows(2).map(|pair| (pair[1] - pair[0]) as f64).collect();

        Some(Self {
            mean,
            std_dev,
            skewness,
            kurtosis,
            range: max - min,
            zero_crossings,
            rms,
            snr: mean / std_dev,
            peak_count: peaks.len() as f64,
            avg_peak_height: stats::mean(&heights),
            peak_variability: stats::std_dev(&heights),
            avg_inter_peak_interval: stats::mean(&intervals),
            std_inter_peak_interval: stats::std_dev(&intervals),
        })
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.mean,
            self.std_dev,
            self.skewness,
            self.kurtosis,
            self.range,
            self.zero_crossings,
            self.rms,
            self.snr,
            self.peak_count,
            self.avg_peak_height,
            self.peak_variability,
            self.avg_inter_peak_interval,
            self.std_inter_peak_interval,
        ]
    }
}

/// Standardisation parameters exported with a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn normalize(&self, features: &[f64]) -> Option<Vec<f64>> {
        if features.len() != self.mean.len() || features.len() != self.scale.len() {
            return None;
        }
        features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(feature, (mean, scale))| {
                if *scale == 0.0 {
                    None
                } else {
                    Some((feature - mean) / scale)
                }
            })
            .collect()
    }
}

/// Predicts a class index: 0 = poor, 1 = good, 2 = excellent.
pub trait QualityClassifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Option<usize>;
}

/// One weight row and bias per class; the class with the largest logit wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl QualityClassifier for LinearClassifier {
    fn predict(&self, features: &[f64]) -> Option<usize> {
        if self.weights.len() != self.bias.len() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (class, (row, bias)) in self.weights.iter().zip(self.bias.iter()).enumerate() {
            if row.len() != features.len() {
                return None;
            }
            let logit = row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + bias;
            if !logit.is_finite() {
                return None;
            }
            if best.map_or(true, |(_, current)| logit > current) {
                best = Some((class, logit));
            }
        }
        best.map(|(class, _)| class)
    }
}

pub struct ClassifierScorer<C> {
    classifier: C,
    scaler: FeatureScaler,
    fallback: DispersionScorer,
}

impl<C: QualityClassifier> ClassifierScorer<C> {
    pub fn new(classifier: C, scaler: FeatureScaler, fallback: DispersionScorer) -> Self {
        Self {
            classifier,
            scaler,
            fallback,
        }
    }

    fn classify(&self, samples: &[RawSample]) -> Option<SignalQualityRating> {
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let features = QualityFeatures::extract(&values)?;
        let normalized = self.scaler.normalize(&features.to_vec())?;
        match self.classifier.predict(&normalized)? {
            0 => Some(SignalQualityRating::Poor),
            1 => Some(SignalQualityRating::Good),
            2 => Some(SignalQualityRating::Excellent),
            _ => None,
        }
    }
}

impl<C: QualityClassifier> SignalQualityScorer for ClassifierScorer<C> {
    fn score(&self, samples: &[RawSample]) -> SignalQualityRating {
        if samples.is_empty() {
            return SignalQualityRating::Poor;
        }
        match self.classify(samples) {
            Some(rating) => rating,
            None => {
                tracing::debug!("Quality classifier unavailable for this window, using dispersion scorer");
                self.fallback.score(samples)
            }
        }
    }
}
