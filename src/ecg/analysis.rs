use serde::{Deserialize, Serialize};

use crate::ecg::hrr::{compute_hrr, peak_heart_rate, HRR_INTERVAL_MS, HRR_MAX_POINTS};
use crate::ecg::metrics::{
    compute_metrics, HeartRateSource, MetricsConfig, HRV_WINDOW_SIZE, MIN_ECG_SAMPLES, MIN_RR_INTERVALS,
};
use crate::ecg::peak_detection::ThresholdStrategy;
use crate::ecg::signal_quality::{DispersionScorer, QualityPreset, SignalQualityScorer};
use crate::ecg::stats::{self, round_to_i32};
use crate::models::ecg::{
    ActivitySegment, ActivityType, EcgMetrics, HeartRateSample, HeartRateSummary, HrrPoint, RawSample,
    SignalQualityRating,
};

/// Tunables of the signal pipeline, read from the `analysis` section of the config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    pub sampling_rate_hz: f64,
    pub threshold: ThresholdStrategy,
    pub hrv_window_size: usize,
    pub min_rr_intervals: usize,
    pub min_ecg_samples: usize,
    pub heart_rate_source: HeartRateSource,
    pub quality: QualityPreset,
    pub quality_recent_window_secs: Option<f64>,
    pub hrr_interval_ms: i64,
    pub hrr_max_points: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 130.0,
            threshold: ThresholdStrategy::Adaptive,
            hrv_window_size: HRV_WINDOW_SIZE,
            min_rr_intervals: MIN_RR_INTERVALS,
            min_ecg_samples: MIN_ECG_SAMPLES,
            heart_rate_source: HeartRateSource::ReportedStream,
            quality: QualityPreset::SensorRaw,
            quality_recent_window_secs: Some(5.0),
            hrr_interval_ms: HRR_INTERVAL_MS,
            hrr_max_points: HRR_MAX_POINTS,
        }
    }
}

impl AnalysisSettings {
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            sampling_rate_hz: self.sampling_rate_hz,
            threshold: self.threshold,
            hrv_window_size: self.hrv_window_size,
            min_rr_intervals: self.min_rr_intervals,
            min_ecg_samples: self.min_ecg_samples,
            heart_rate_source: self.heart_rate_source,
        }
    }

    pub fn quality_scorer(&self) -> DispersionScorer {
        let scorer = DispersionScorer::from_preset(self.quality);
        match self.quality_recent_window_secs {
            Some(seconds) => scorer.with_recent_window(seconds, self.sampling_rate_hz),
            None => scorer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAnalysis {
    pub metrics: EcgMetrics,
    pub signal_quality: SignalQualityRating,
    pub heart_rate: Option<HeartRateSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentQuality {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub signal_quality: SignalQualityRating,
    pub heart_rate: Option<HeartRateSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub rest_metrics: EcgMetrics,
    pub exercise_metrics: EcgMetrics,
    pub recovery_metrics: EcgMetrics,
    pub hrr_points: Vec<HrrPoint>,
    pub segments: Vec<SegmentQuality>,
    pub overall_quality: SignalQualityRating,
    pub baseline_hr: Option<i32>,
    pub peak_hr: Option<i32>,
}

impl SessionAnalysis {
    pub fn metrics_for(&self, activity_type: ActivityType) -> &EcgMetrics {
        match activity_type {
            ActivityType::Rest => &self.rest_metrics,
            ActivityType::Exercise => &self.exercise_metrics,
            ActivityType::Recovery => &self.recovery_metrics,
        }
    }
}

pub fn summarize_heart_rate(hr: &[HeartRateSample]) -> Option<HeartRateSummary> {
    let values: Vec<f64> = hr.iter().map(|s| s.value as f64).collect();
    Some(HeartRateSummary {
        min: hr.iter().map(|s| s.value).min()?,
        max: hr.iter().map(|s| s.value).max()?,
        mean: round_to_i32(stats::mean(&values)),
        count: hr.len(),
    })
}

/// Metrics, quality and heart rate summary for one slice of the streams.
pub fn analyze_segment(
    ecg: &[RawSample],
    hr: &[HeartRateSample],
    settings: &AnalysisSettings,
) -> SegmentAnalysis {
    SegmentAnalysis {
        metrics: compute_metrics(ecg, hr, &settings.metrics_config()),
        signal_quality: settings.quality_scorer().score(ecg),
        heart_rate: summarize_heart_rate(hr),
    }
}

fn find_segment(segments: &[ActivitySegment], activity_type: ActivityType) -> Option<&ActivitySegment> {
    segments.iter().find(|s| s.activity_type == activity_type)
}

/// Full post-session analysis over the recorded streams and closed segments.
///
/// Absent segments yield zeroed metrics and no quality entry. The overall quality is the
/// worst rating among present segments, or `poor` when nothing was recorded.
#[tracing::instrument(name = "Analyze session", skip(ecg, hr, settings), fields(ecg_samples = ecg.len(), hr_samples = hr.len()))]
pub fn analyze_session(
    ecg: &[RawSample],
    hr: &[HeartRateSample],
    segments: &[ActivitySegment],
    settings: &AnalysisSettings,
) -> SessionAnalysis {
    let config = settings.metrics_config();
    let scorer = settings.quality_scorer();

    let mut metrics = [EcgMetrics::empty(), EcgMetrics::empty(), EcgMetrics::empty()];
    let mut qualities = Vec::new();
    for (slot, activity_type) in ActivityType::ORDER.iter().enumerate() {
        let Some(segment) = find_segment(segments, *activity_type) else {
            continue;
        };
        let ecg_slice = segment.slice(ecg);
        let hr_slice = segment.slice(hr);
        metrics[slot] = compute_metrics(&ecg_slice, &hr_slice, &config);
        qualities.push(SegmentQuality {
            activity_type: *activity_type,
            signal_quality: scorer.score(&ecg_slice),
            heart_rate: summarize_heart_rate(&hr_slice),
        });
        tracing::debug!(
            "{} segment: {} ECG samples, {} beats detected",
            activity_type,
            ecg_slice.len(),
            metrics[slot].r_peaks.len()
        );
    }

    let exercise = find_segment(segments, ActivityType::Exercise);
    let recovery = find_segment(segments, ActivityType::Recovery);
    let hrr_points = compute_hrr(hr, exercise, recovery, settings.hrr_interval_ms, settings.hrr_max_points);

    let overall_quality = qualities
        .iter()
        .map(|q| q.signal_quality)
        .max()
        .unwrap_or(SignalQualityRating::Poor);
    let baseline_hr = qualities
        .iter()
        .find(|q| q.activity_type == ActivityType::Rest)
        .and_then(|q| q.heart_rate.map(|summary| summary.mean));
    let peak_hr = exercise.and_then(|segment| peak_heart_rate(hr, segment));

    let [rest_metrics, exercise_metrics, recovery_metrics] = metrics;
    SessionAnalysis {
        rest_metrics,
        exercise_metrics,
        recovery_metrics,
        hrr_points,
        segments: qualities,
        overall_quality,
        baseline_hr,
        peak_hr,
    }
}
