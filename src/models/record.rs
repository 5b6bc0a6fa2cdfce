use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ecg::analysis::SessionAnalysis;
use crate::models::ecg::{ActivitySegment, ActivityType, EcgMetrics, HeartRateSample, HrrPoint, RawSample};

/// One completed session as it is stored. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub user_id: String,
    pub datetime: DateTime<Utc>,
    pub ecg: Vec<RawSample>,
    pub hr: Vec<HeartRateSample>,
    pub rest_metrics: EcgMetrics,
    pub exercise_metrics: EcgMetrics,
    pub recovery_metrics: EcgMetrics,
    pub activity_segments: Vec<ActivitySegment>,
    pub hrr_points: Vec<HrrPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record {
    pub fn new(
        user_id: String,
        datetime: DateTime<Utc>,
        ecg: Vec<RawSample>,
        hr: Vec<HeartRateSample>,
        activity_segments: Vec<ActivitySegment>,
        analysis: SessionAnalysis,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            datetime,
            ecg,
            hr,
            rest_metrics: analysis.rest_metrics,
            exercise_metrics: analysis.exercise_metrics,
            recovery_metrics: analysis.recovery_metrics,
            activity_segments,
            hrr_points: analysis.hrr_points,
            notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordUploadRequest {
    pub user_id: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ecg: Vec<RawSample>,
    #[serde(default)]
    pub hr: Vec<HeartRateSample>,
    #[serde(default)]
    pub activity_segments: Vec<ActivitySegment>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub user_id: Option<String>,
}

/// Listing entry without the raw streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: Uuid,
    pub user_id: String,
    pub datetime: DateTime<Utc>,
    pub rest_metrics: EcgMetrics,
    pub exercise_metrics: EcgMetrics,
    pub recovery_metrics: EcgMetrics,
    pub activity_segments: Vec<ActivitySegment>,
    pub hrr_points: Vec<HrrPoint>,
    pub notes: Option<String>,
    pub ecg_samples: usize,
    pub hr_samples: usize,
}

impl From<&Record> for RecordSummary {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.clone(),
            datetime: record.datetime,
            rest_metrics: record.rest_metrics.clone(),
            exercise_metrics: record.exercise_metrics.clone(),
            recovery_metrics: record.recovery_metrics.clone(),
            activity_segments: record.activity_segments.clone(),
            hrr_points: record.hrr_points.clone(),
            notes: record.notes.clone(),
            ecg_samples: record.ecg.len(),
            hr_samples: record.hr.len(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Segment {activity_type} has start {start} not before end {end}")]
    EmptySegment {
        activity_type: String,
        start: i64,
        end: i64,
    },

    #[error("Segment {0} is out of order or repeated")]
    OutOfOrder(String),

    #[error("Segment {0} overlaps the previous segment")]
    Overlapping(String),
}

/// Segments must be non-empty, non-overlapping, and follow rest, exercise, recovery without
/// repeats. Missing phases are allowed.
pub fn validate_segments(segments: &[ActivitySegment]) -> Result<(), ValidationError> {
    let mut previous: Option<&ActivitySegment> = None;
    for segment in segments {
        if segment.start >= segment.end {
            return Err(ValidationError::EmptySegment {
                activity_type: segment.activity_type.to_string(),
                start: segment.start,
                end: segment.end,
            });
        }
        if let Some(previous) = previous {
            if order_of(segment) <= order_of(previous) {
                return Err(ValidationError::OutOfOrder(segment.activity_type.to_string()));
            }
            if segment.start < previous.end {
                return Err(ValidationError::Overlapping(segment.activity_type.to_string()));
            }
        }
        previous = Some(segment);
    }
    Ok(())
}

fn order_of(segment: &ActivitySegment) -> usize {
    ActivityType::ORDER
        .iter()
        .position(|t| *t == segment.activity_type)
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_segments_are_valid() {
        let segments = vec![
            ActivitySegment::new(ActivityType::Rest, 10, 20),
            ActivitySegment::new(ActivityType::Exercise, 20, 40),
            ActivitySegment::new(ActivityType::Recovery, 40, 50),
        ];
        assert!(validate_segments(&segments).is_ok());
        assert!(validate_segments(&segments[1..]).is_ok());
        assert!(validate_segments(&[]).is_ok());
    }

    #[test]
    fn invalid_segment_lists() {
        let empty = [ActivitySegment::new(ActivityType::Rest, 20, 20)];
        assert!(matches!(validate_segments(&empty), Err(ValidationError::EmptySegment { .. })));

        let repeated = [
            ActivitySegment::new(ActivityType::Rest, 0, 10),
            ActivitySegment::new(ActivityType::Rest, 10, 20),
        ];
        assert_eq!(validate_segments(&repeated), Err(ValidationError::OutOfOrder("rest".into())));

        let overlapping = [
            ActivitySegment::new(ActivityType::Rest, 0, 10),
            ActivitySegment::new(ActivityType::Exercise, 5, 20),
        ];
        assert_eq!(
            validate_segments(&overlapping),
            Err(ValidationError::Overlapping("exercise".into()))
        );
    }
}
