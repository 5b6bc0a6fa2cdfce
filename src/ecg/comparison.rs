use serde::{Deserialize, Serialize};

use crate::ecg::metrics::{compute_metrics, MetricsConfig};
use crate::ecg::stats;
use crate::models::ecg::{HeartRateSample, RawSample};

/// One recording reduced to what the comparison needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonInput {
    #[serde(default)]
    pub ecg: Vec<RawSample>,
    #[serde(default)]
    pub hr: Vec<HeartRateSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionComparison {
    pub average_baseline_hr: f64,
    pub average_session_hr: f64,
    /// Session minus baseline, in bpm
    pub difference: f64,
    pub baseline_hrv: i32,
    pub session_hrv: i32,
    /// Relative HRV change in %, 0 when the baseline HRV is 0
    pub hrv_change: f64,
}

pub fn average_heart_rate(hr: &[HeartRateSample]) -> f64 {
    let values: Vec<f64> = hr.iter().map(|s| s.value as f64).collect();
    stats::mean(&values)
}

pub fn percent_change(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline * 100.0
}

pub fn compare_sessions(baseline: &ComparisonInput, current: &ComparisonInput, config: &MetricsConfig) -> SessionComparison {
    let average_baseline_hr = average_heart_rate(&baseline.hr);
    let average_session_hr = average_heart_rate(&current.hr);
    let baseline_hrv = compute_metrics(&baseline.ecg, &baseline.hr, config).heart_rate_variability;
    let session_hrv = compute_metrics(&current.ecg, &current.hr, config).heart_rate_variability;

    SessionComparison {
        average_baseline_hr,
        average_session_hr,
        difference: average_session_hr - average_baseline_hr,
        baseline_hrv,
        session_hrv,
        hrv_change: percent_change(baseline_hrv as f64, session_hrv as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_guards_zero_baseline() {
        assert_eq!(percent_change(0.0, 40.0), 0.0);
        assert_eq!(percent_change(40.0, 50.0), 25.0);
    }

    #[test]
    fn empty_recordings_compare_to_zero() {
        let comparison = compare_sessions(&ComparisonInput::default(), &ComparisonInput::default(), &MetricsConfig::default());
        assert_eq!(comparison.difference, 0.0);
        assert_eq!(comparison.hrv_change, 0.0);
        assert!(comparison.average_session_hr.is_finite());
    }

    #[test]
    fn average_difference_from_reported_streams() {
        let baseline = ComparisonInput {
            ecg: Vec::new(),
            hr: (0..10).map(|i| HeartRateSample { timestamp: i * 1000, value: 60 }).collect(),
        };
        let current = ComparisonInput {
            ecg: Vec::new(),
            hr: (0..10).map(|i| HeartRateSample { timestamp: i * 1000, value: 75 }).collect(),
        };
        let comparison = compare_sessions(&baseline, &current, &MetricsConfig::default());
        assert_eq!(comparison.difference, 15.0);
    }
}
