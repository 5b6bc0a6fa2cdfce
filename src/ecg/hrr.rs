use crate::models::ecg::{ActivitySegment, HeartRateSample, HrrPoint};

pub const HRR_INTERVAL_MS: i64 = 30_000;
pub const HRR_MAX_POINTS: usize = 5;

/// Highest reported heart rate inside `segment`.
pub fn peak_heart_rate(hr: &[HeartRateSample], segment: &ActivitySegment) -> Option<i32> {
    hr.iter()
        .filter(|s| segment.contains(s.timestamp))
        .map(|s| s.value)
        .max()
}

/// Value of the first sample at or after `timestamp`.
pub fn heart_rate_at_or_after(hr: &[HeartRateSample], timestamp: i64) -> Option<i32> {
    hr.iter().find(|s| s.timestamp >= timestamp).map(|s| s.value)
}

/// Heart rate recovery against the exercise peak, sampled every `interval_ms` from the
/// start of recovery. Offsets past the end of the recovery segment are not emitted;
/// offsets with no heart rate yet report `None`.
pub fn compute_hrr(
    hr: &[HeartRateSample],
    exercise: Option<&ActivitySegment>,
    recovery: Option<&ActivitySegment>,
    interval_ms: i64,
    max_points: usize,
) -> Vec<HrrPoint> {
    let (Some(exercise), Some(recovery)) = (exercise, recovery) else {
        return Vec::new();
    };
    if interval_ms <= 0 {
        return Vec::new();
    }

    let peak = peak_heart_rate(hr, exercise);
    let mut points = Vec::with_capacity(max_points);
    for i in 0..max_points as i64 {
        let t = recovery.start + i * interval_ms;
        if t > recovery.end {
            break;
        }
        let current = heart_rate_at_or_after(hr, t);
        points.push(HrrPoint {
            time: (i * interval_ms) as f64 / 1000.0,
            hr: current,
            hrr: peak.zip(current).map(|(peak, current)| peak - current),
        });
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ecg::ActivityType;

    fn sample(timestamp: i64, value: i32) -> HeartRateSample {
        HeartRateSample { timestamp, value }
    }

    #[test]
    fn missing_segments_give_empty_series() {
        let exercise = ActivitySegment::new(ActivityType::Exercise, 0, 10);
        assert!(compute_hrr(&[], Some(&exercise), None, HRR_INTERVAL_MS, HRR_MAX_POINTS).is_empty());
        assert!(compute_hrr(&[], None, Some(&exercise), HRR_INTERVAL_MS, HRR_MAX_POINTS).is_empty());
    }

    #[test]
    fn no_exercise_samples_means_no_delta() {
        let exercise = ActivitySegment::new(ActivityType::Exercise, 0, 1000);
        let recovery = ActivitySegment::new(ActivityType::Recovery, 5000, 40_000);
        let hr = vec![sample(5000, 120), sample(36_000, 110)];
        let points = compute_hrr(&hr, Some(&exercise), Some(&recovery), HRR_INTERVAL_MS, HRR_MAX_POINTS);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], HrrPoint { time: 0.0, hr: Some(120), hrr: None });
        assert_eq!(points[1], HrrPoint { time: 30.0, hr: Some(110), hrr: None });
    }

    #[test]
    fn unreached_offsets_report_null_heart_rate() {
        let exercise = ActivitySegment::new(ActivityType::Exercise, 0, 1000);
        let recovery = ActivitySegment::new(ActivityType::Recovery, 1000, 200_000);
        let hr = vec![sample(500, 160), sample(1000, 150), sample(20_000, 140)];
        let points = compute_hrr(&hr, Some(&exercise), Some(&recovery), HRR_INTERVAL_MS, HRR_MAX_POINTS);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], HrrPoint { time: 0.0, hr: Some(150), hrr: Some(10) });
        assert!(points[1..].iter().all(|p| p.hr.is_none() && p.hrr.is_none()));
    }

    #[test]
    fn sub_second_intervals_keep_fractional_offsets() {
        let exercise = ActivitySegment::new(ActivityType::Exercise, 0, 1000);
        let recovery = ActivitySegment::new(ActivityType::Recovery, 1000, 10_000);
        let hr = vec![sample(500, 160), sample(1000, 150), sample(9_000, 120)];
        let points = compute_hrr(&hr, Some(&exercise), Some(&recovery), 1_500, 3);
        let times: Vec<f64> = points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 1.5, 3.0]);
    }
}
