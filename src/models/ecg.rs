use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One raw ECG reading as delivered by the chest strap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: i64,
    pub value: f64,
}

/// One reported instantaneous heart rate (bpm), roughly 1 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub timestamp: i64,
    pub value: i32,
}

/// Anything ordered on the millisecond timeline.
pub trait Timestamped {
    fn timestamp(&self) -> i64;
}

impl Timestamped for RawSample {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Timestamped for HeartRateSample {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Rest,
    Exercise,
    Recovery,
}

impl ActivityType {
    pub const ORDER: [ActivityType; 3] = [ActivityType::Rest, ActivityType::Exercise, ActivityType::Recovery];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Rest => "rest",
            ActivityType::Exercise => "exercise",
            ActivityType::Recovery => "recovery",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rest" => Ok(ActivityType::Rest),
            "exercise" => Ok(ActivityType::Exercise),
            "recovery" => Ok(ActivityType::Recovery),
            other => Err(format!("{} is not one of rest, exercise, recovery", other)),
        }
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySegment {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub start: i64,
    pub end: i64,
}

impl ActivitySegment {
    pub fn new(activity_type: ActivityType, start: i64, end: i64) -> Self {
        Self { activity_type, start, end }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// The part of `data` that falls inside this segment's window.
    pub fn slice<T: Timestamped + Clone>(&self, data: &[T]) -> Vec<T> {
        data.iter()
            .filter(|point| self.contains(point.timestamp()))
            .cloned()
            .collect()
    }
}

/// Cardiac metrics for one closed segment. Field names match the stored record format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcgMetrics {
    pub avg_heart_rate: i32,
    pub median_heart_rate: i32,
    pub min_heart_rate: i32,
    pub max_heart_rate: i32,
    /// RMSSD in ms
    pub heart_rate_variability: i32,
    pub rr_intervals: Vec<i64>,
    pub r_peaks: Vec<i64>,
    pub total_beats: i64,
    pub duration: i64,
}

impl EcgMetrics {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrrPoint {
    /// Seconds since the recovery segment started, fractional for sub-second intervals
    pub time: f64,
    pub hr: Option<i32>,
    pub hrr: Option<i32>,
}

/// Ordered best to worst, so `Excellent < Poor` when compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalQualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Display for SignalQualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SignalQualityRating::Excellent => "excellent",
            SignalQualityRating::Good => "good",
            SignalQualityRating::Fair => "fair",
            SignalQualityRating::Poor => "poor",
        };
        write!(f, "{}", label)
    }
}

/// Reported heart rate summary for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    pub min: i32,
    pub max: i32,
    pub mean: i32,
    pub count: usize,
}
