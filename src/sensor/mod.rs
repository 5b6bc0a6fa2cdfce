//! Ingestion boundary between the chest strap and the signal pipeline.

pub mod frames;

pub use frames::{parse_ecg_frame, parse_heart_rate_measurement, stamp_ecg_frame, stamp_ecg_frames};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IngestError {
    #[error("Negative timestamp: {0}")]
    NegativeTimestamp(i64),

    #[error("Non-finite sample value at {0}")]
    NonFiniteValue(i64),

    #[error("Malformed sensor frame: {0}")]
    MalformedFrame(String),

    #[error("Recording session is closed")]
    SessionClosed,
}
