use crate::ecg::stats;

pub const MIN_HR_BPM: f64 = 40.0;
pub const MAX_HR_BPM: f64 = 220.0;
/// Relative jump against both neighbours that marks an interval as an artifact.
pub const ARTIFACT_TOLERANCE: f64 = 0.2;

/// Shortest interval accepted, in ms (220 bpm).
pub fn min_rr_ms() -> f64 {
    60_000.0 / MAX_HR_BPM
}

/// Longest interval accepted, in ms (40 bpm).
pub fn max_rr_ms() -> f64 {
    60_000.0 / MIN_HR_BPM
}

/// Consecutive peak differences in ms. Intervals implying a rate outside
/// [40, 220] bpm are dropped, not clamped.
pub fn rr_intervals(peaks: &[i64]) -> Vec<i64> {
    let (min, max) = (min_rr_ms(), max_rr_ms());
    peaks
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|&interval| {
            let ms = interval as f64;
            ms >= min && ms <= max
        })
        .collect()
}

/// Drops interior intervals that differ by more than 20 % from both of their neighbours.
/// The first and last interval are always kept.
pub fn filter_artifacts(rr: &[i64]) -> Vec<i64> {
    if rr.len() < 3 {
        return rr.to_vec();
    }

    let mut filtered = Vec::with_capacity(rr.len());
    filtered.push(rr[0]);
    for window in rr.windows(3) {
        let (prev, curr, next) = (window[0] as f64, window[1] as f64, window[2] as f64);
        let off_prev = (curr - prev).abs() > ARTIFACT_TOLERANCE * prev;
        let off_next = (curr - next).abs() > ARTIFACT_TOLERANCE * next;
        if off_prev && off_next {
            tracing::debug!("Dropping RR artifact {} ms (neighbours {} / {})", curr, prev, next);
        } else {
            filtered.push(window[1]);
        }
    }
    filtered.push(rr[rr.len() - 1]);
    filtered
}

/// Instantaneous rate in bpm for each interval.
pub fn instantaneous_rates(rr: &[i64]) -> Vec<f64> {
    rr.iter()
        .filter(|&&interval| interval > 0)
        .map(|&interval| 60_000.0 / interval as f64)
        .collect()
}

/// RMSSD over the most recent `window_size` artifact-free intervals.
/// Returns 0 when fewer than `min_intervals` survive the artifact filter.
pub fn rmssd(rr: &[i64], window_size: usize, min_intervals: usize) -> f64 {
    let filtered = filter_artifacts(rr);
    if filtered.len() < min_intervals.max(2) {
        return 0.0;
    }

    let recent = &filtered[filtered.len().saturating_sub(window_size.max(2))..];
    let squared_diffs: Vec<f64> = recent
        .windows(2)
        .map(|pair| ((pair[1] - pair[0]) as f64).powi(2))
        .collect();

    stats::mean(&squared_diffs).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_outside_physiological_range_are_dropped() {
        // 200 ms (300 bpm) and 2000 ms (30 bpm) are rejected
        let peaks = [0, 800, 1000, 1800, 3800, 4600];
        assert_eq!(rr_intervals(&peaks), vec![800, 800, 800]);
    }

    #[test]
    fn all_intervals_within_bounds() {
        let peaks: Vec<i64> = vec![0, 250, 273, 600, 2100, 2400, 3901];
        for interval in rr_intervals(&peaks) {
            let bpm = 60_000.0 / interval as f64;
            assert!((MIN_HR_BPM..=MAX_HR_BPM).contains(&bpm));
        }
    }

    #[test]
    fn artifact_filter_needs_three_intervals() {
        assert_eq!(filter_artifacts(&[800, 300]), vec![800, 300]);
    }

    #[test]
    fn artifact_differing_from_both_neighbours_is_removed() {
        let rr = [800, 810, 400, 805, 820];
        assert_eq!(filter_artifacts(&rr), vec![800, 810, 805, 820]);
    }

    #[test]
    fn edges_are_never_filtered() {
        let rr = [400, 800, 810, 1300];
        assert_eq!(filter_artifacts(&rr), vec![400, 800, 810, 1300]);
    }

    #[test]
    fn rmssd_is_zero_with_too_few_intervals() {
        assert_eq!(rmssd(&[800, 820, 790, 810], 8, 5), 0.0);
    }

    #[test]
    fn rmssd_of_alternating_intervals() {
        let rr = [800, 820, 800, 820, 800, 820];
        assert!((rmssd(&rr, 8, 5) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn rmssd_uses_most_recent_window() {
        // Early large swings fall outside the window of 3 intervals
        let rr = [700, 900, 700, 800, 800, 800];
        assert_eq!(rmssd(&rr, 3, 5), 0.0);
        assert!(rmssd(&rr, 8, 5) > 0.0);
    }
}
