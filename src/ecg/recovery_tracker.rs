use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::models::ecg::HeartRateSample;

/// % rise over baseline that marks the start of exercise
pub const HR_RISE_THRESHOLD: f64 = 10.0;
/// % drop from peak that marks the start of recovery
pub const HR_RECOVERY_THRESHOLD: f64 = 5.0;
/// % distance from baseline that counts as recovered
pub const HR_BASELINE_THRESHOLD: f64 = 2.0;
/// Time past the peak before a drop can count as recovery
pub const PEAK_SETTLE_MS: i64 = 5_000;
pub const HISTORY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryState {
    pub baseline_time: Option<i64>,
    pub baseline_heart_rate: i32,
    pub exercise_start_time: Option<i64>,
    pub peak_heart_rate: i32,
    pub peak_heart_rate_time: Option<i64>,
    pub recovery_start_time: Option<i64>,
    /// Time from recovery start back to baseline, in ms
    pub recovery_time: Option<i64>,
    pub status: RecoveryStatus,
}

/// Follows a live heart rate against a resting baseline and detects exercise start, the
/// peak, the start of recovery and the return to baseline.
#[derive(Debug, Clone, Default)]
pub struct RecoveryTracker {
    state: RecoveryState,
    history: VecDeque<HeartRateSample>,
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    pub fn history(&self) -> impl Iterator<Item = &HeartRateSample> {
        self.history.iter()
    }

    /// Starts a fresh tracking run against `heart_rate`.
    pub fn set_baseline(&mut self, heart_rate: i32, timestamp: i64) {
        tracing::info!("Set baseline heart rate: {} bpm at {}", heart_rate, timestamp);
        self.state = RecoveryState {
            baseline_time: Some(timestamp),
            baseline_heart_rate: heart_rate,
            ..RecoveryState::default()
        };
    }

    pub fn observe(&mut self, sample: HeartRateSample) -> &RecoveryState {
        self.history.push_back(sample);
        while self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }

        self.update(sample.value, sample.timestamp);
        &self.state
    }

    fn update(&mut self, current: i32, now: i64) {
        if current <= 0 || self.state.baseline_time.is_none() || self.state.baseline_heart_rate <= 0 {
            return;
        }
        let baseline = self.state.baseline_heart_rate as f64;
        let state = &mut self.state;

        if state.exercise_start_time.is_none() {
            let increase = (current as f64 - baseline) / baseline * 100.0;
            if increase < HR_RISE_THRESHOLD {
                return;
            }
            tracing::info!("Exercise started: heart rate {:.1}% above baseline", increase);
            state.exercise_start_time = Some(now);
            state.status = RecoveryStatus::NotStarted;
        }

        if current > state.peak_heart_rate {
            state.peak_heart_rate = current;
            state.peak_heart_rate_time = Some(now);
        }

        if state.recovery_start_time.is_none() {
            if let Some(peak_time) = state.peak_heart_rate_time {
                if state.peak_heart_rate > 0 && now - peak_time > PEAK_SETTLE_MS {
                    let peak = state.peak_heart_rate as f64;
                    let decrease = (peak - current as f64) / peak * 100.0;
                    if decrease >= HR_RECOVERY_THRESHOLD {
                        tracing::info!("Recovery started: heart rate {:.1}% below peak", decrease);
                        state.recovery_start_time = Some(now);
                        state.status = RecoveryStatus::InProgress;
                    }
                }
            }
        }

        if let (Some(recovery_start), None) = (state.recovery_start_time, state.recovery_time) {
            let from_baseline = ((current as f64 - baseline) / baseline * 100.0).abs();
            if from_baseline <= HR_BASELINE_THRESHOLD {
                state.recovery_time = Some(now - recovery_start);
                state.status = RecoveryStatus::Completed;
                tracing::info!("Recovery completed in {} ms", now - recovery_start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr(timestamp: i64, value: i32) -> HeartRateSample {
        HeartRateSample { timestamp, value }
    }

    #[test]
    fn nothing_happens_without_baseline() {
        let mut tracker = RecoveryTracker::new();
        let state = tracker.observe(hr(0, 150)).clone();
        assert_eq!(state, RecoveryState::default());
    }

    #[test]
    fn full_exercise_and_recovery_cycle() {
        let mut tracker = RecoveryTracker::new();
        tracker.set_baseline(60, 0);

        tracker.observe(hr(1_000, 62));
        assert!(tracker.state().exercise_start_time.is_none());

        tracker.observe(hr(2_000, 70));
        assert_eq!(tracker.state().exercise_start_time, Some(2_000));

        tracker.observe(hr(10_000, 150));
        tracker.observe(hr(12_000, 140));
        // Still within the settle window after the peak
        assert!(tracker.state().recovery_start_time.is_none());

        tracker.observe(hr(16_000, 140));
        assert_eq!(tracker.state().recovery_start_time, Some(16_000));
        assert_eq!(tracker.state().status, RecoveryStatus::InProgress);

        tracker.observe(hr(76_000, 61));
        assert_eq!(tracker.state().status, RecoveryStatus::Completed);
        assert_eq!(tracker.state().recovery_time, Some(60_000));
        assert_eq!(tracker.state().peak_heart_rate, 150);
    }

    #[test]
    fn history_is_bounded() {
        let mut tracker = RecoveryTracker::new();
        for i in 0..250 {
            tracker.observe(hr(i * 1000, 70));
        }
        assert_eq!(tracker.history().count(), HISTORY_LEN);
        assert_eq!(tracker.history().next().map(|s| s.timestamp), Some(150_000));
    }
}
