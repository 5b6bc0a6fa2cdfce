use crate::models::ecg::{HeartRateSample, RawSample, Timestamped};
use crate::sensor::IngestError;

/// Samples that can be checked at the ingestion boundary.
pub trait ValidSample: Timestamped {
    fn validate(&self) -> Result<(), IngestError> {
        if self.timestamp() < 0 {
            return Err(IngestError::NegativeTimestamp(self.timestamp()));
        }
        Ok(())
    }
}

impl ValidSample for RawSample {
    fn validate(&self) -> Result<(), IngestError> {
        if self.timestamp < 0 {
            return Err(IngestError::NegativeTimestamp(self.timestamp));
        }
        if !self.value.is_finite() {
            return Err(IngestError::NonFiniteValue(self.timestamp));
        }
        Ok(())
    }
}

impl ValidSample for HeartRateSample {}

/// Rejects the whole batch on the first invalid sample.
pub fn validate_samples<T: ValidSample>(samples: &[T]) -> Result<(), IngestError> {
    samples.iter().try_for_each(|sample| sample.validate())
}

/// Drops samples whose timestamp is not strictly after the last kept one, starting from
/// `last_kept` (the newest timestamp already stored). Returns the number of dropped samples.
pub fn retain_increasing<T: Timestamped>(samples: &mut Vec<T>, last_kept: Option<i64>) -> usize {
    let original_len = samples.len();
    let mut last = last_kept;

    samples.retain(|sample| {
        let timestamp = sample.timestamp();
        match last {
            Some(previous) if timestamp <= previous => {
                tracing::debug!(
                    "Filtering out sample with non-increasing timestamp: {} <= {}",
                    timestamp,
                    previous
                );
                false
            }
            _ => {
                last = Some(timestamp);
                true
            }
        }
    });

    original_len - samples.len()
}
