//! Live recording sessions: the phase state machine plus the sample buffers it partitions.

pub mod phase;
pub mod recording;

use serde::{Deserialize, Serialize};

pub use phase::{PhaseMinimums, PhaseMinimumsPreset, PhaseSegmenter, PhaseTransition, SessionPhase};
pub use recording::{PushOutcome, RecordingSession, SessionStatus};

/// Electrode settling time cut from the start of the rest phase.
pub const REST_SETTLING_MS: i64 = 10_000;
/// One hour of ECG at 130 Hz.
pub const MAX_ECG_SAMPLES: usize = 468_000;
pub const MAX_HR_SAMPLES: usize = 7_200;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Session has not been started")]
    NotStarted,

    #[error("Session has already been started")]
    AlreadyStarted,

    #[error("Session is already finished")]
    AlreadyFinished,

    #[error("Phase {phase} too short: {elapsed_ms} ms elapsed, {required_ms} ms required")]
    PhaseTooShort {
        phase: SessionPhase,
        elapsed_ms: i64,
        required_ms: i64,
    },

    #[error("Transition time {now} is not after the phase start {phase_start}")]
    ClockWentBackwards { phase_start: i64, now: i64 },

    #[error("Session is still in phase {0}")]
    Incomplete(SessionPhase),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub phase_minimums: PhaseMinimumsPreset,
    pub rest_settling_ms: i64,
    pub max_ecg_samples: usize,
    pub max_hr_samples: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            phase_minimums: PhaseMinimumsPreset::Testing,
            rest_settling_ms: REST_SETTLING_MS,
            max_ecg_samples: MAX_ECG_SAMPLES,
            max_hr_samples: MAX_HR_SAMPLES,
        }
    }
}
