use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::models::ecg::{ActivitySegment, ActivityType};
use crate::session::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Rest,
    Exercise,
    Recovery,
    Done,
}

impl SessionPhase {
    pub fn activity_type(&self) -> Option<ActivityType> {
        match self {
            SessionPhase::Rest => Some(ActivityType::Rest),
            SessionPhase::Exercise => Some(ActivityType::Exercise),
            SessionPhase::Recovery => Some(ActivityType::Recovery),
            SessionPhase::NotStarted | SessionPhase::Done => None,
        }
    }

    fn next(&self) -> SessionPhase {
        match self {
            SessionPhase::NotStarted => SessionPhase::Rest,
            SessionPhase::Rest => SessionPhase::Exercise,
            SessionPhase::Exercise => SessionPhase::Recovery,
            SessionPhase::Recovery | SessionPhase::Done => SessionPhase::Done,
        }
    }
}

impl Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::Rest => "rest",
            SessionPhase::Exercise => "exercise",
            SessionPhase::Recovery => "recovery",
            SessionPhase::Done => "done",
        };
        write!(f, "{}", label)
    }
}

/// Minimum time in each phase before it may be closed. Recovery has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseMinimums {
    pub rest_ms: i64,
    pub exercise_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMinimumsPreset {
    None,
    #[default]
    Testing,
    Production,
}

impl From<PhaseMinimumsPreset> for PhaseMinimums {
    fn from(preset: PhaseMinimumsPreset) -> Self {
        match preset {
            PhaseMinimumsPreset::None => PhaseMinimums { rest_ms: 0, exercise_ms: 0 },
            PhaseMinimumsPreset::Testing => PhaseMinimums { rest_ms: 10_000, exercise_ms: 15_000 },
            PhaseMinimumsPreset::Production => PhaseMinimums { rest_ms: 180_000, exercise_ms: 360_000 },
        }
    }
}

impl PhaseMinimums {
    pub fn required_ms(&self, phase: SessionPhase) -> i64 {
        match phase {
            SessionPhase::Rest => self.rest_ms,
            SessionPhase::Exercise => self.exercise_ms,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhaseTransition {
    /// The closed segment was recorded and the next phase has started.
    Advanced {
        segment: ActivitySegment,
        next: SessionPhase,
    },
    /// Rest did not outlast the settling period. Nothing was recorded and rest continues.
    RestDiscarded { elapsed_ms: i64 },
    /// Recovery closed; the session is done.
    Finished { segment: ActivitySegment },
}

/// Partitions the timeline into rest, exercise and recovery segments.
///
/// Segments are appended in order and never edited afterwards.
#[derive(Debug, Clone)]
pub struct PhaseSegmenter {
    minimums: PhaseMinimums,
    rest_settling_ms: i64,
    phase: SessionPhase,
    phase_start: Option<i64>,
    segments: Vec<ActivitySegment>,
}

impl PhaseSegmenter {
    pub fn new(minimums: PhaseMinimums, rest_settling_ms: i64) -> Self {
        Self {
            minimums,
            rest_settling_ms,
            phase: SessionPhase::NotStarted,
            phase_start: None,
            segments: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn phase_start(&self) -> Option<i64> {
        self.phase_start
    }

    pub fn segments(&self) -> &[ActivitySegment] {
        &self.segments
    }

    pub fn required_ms(&self) -> i64 {
        self.minimums.required_ms(self.phase)
    }

    pub fn elapsed_ms(&self, now: i64) -> i64 {
        self.phase_start.map_or(0, |start| (now - start).max(0))
    }

    pub fn start(&mut self, now: i64) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        tracing::info!("Session started, entering rest at {}", now);
        self.phase = SessionPhase::Rest;
        self.phase_start = Some(now);
        Ok(())
    }

    pub fn can_advance(&self, now: i64) -> bool {
        match self.phase {
            SessionPhase::NotStarted | SessionPhase::Done => false,
            SessionPhase::Recovery => true,
            phase => self.elapsed_ms(now) >= self.minimums.required_ms(phase),
        }
    }

    pub fn advance(&mut self, now: i64) -> Result<PhaseTransition, SessionError> {
        let (phase, phase_start) = match (self.phase, self.phase_start) {
            (SessionPhase::Done, _) => return Err(SessionError::AlreadyFinished),
            (SessionPhase::NotStarted, _) | (_, None) => return Err(SessionError::NotStarted),
            (phase, Some(start)) => (phase, start),
        };
        if now <= phase_start {
            return Err(SessionError::ClockWentBackwards { phase_start, now });
        }

        let elapsed_ms = now - phase_start;
        let required_ms = self.minimums.required_ms(phase);
        if elapsed_ms < required_ms {
            return Err(SessionError::PhaseTooShort { phase, elapsed_ms, required_ms });
        }

        let Some(activity_type) = phase.activity_type() else {
            return Err(SessionError::NotStarted);
        };
        let start = if phase == SessionPhase::Rest {
            if elapsed_ms <= self.rest_settling_ms {
                tracing::warn!(
                    "Rest phase lasted {} ms, not longer than the {} ms settling period; discarding it",
                    elapsed_ms,
                    self.rest_settling_ms
                );
                return Ok(PhaseTransition::RestDiscarded { elapsed_ms });
            }
            phase_start + self.rest_settling_ms
        } else {
            phase_start
        };

        let segment = ActivitySegment::new(activity_type, start, now);
        self.segments.push(segment);
        let next = phase.next();
        self.phase = next;
        tracing::info!("Closed {} segment [{}, {}], now in {}", activity_type, start, now, next);

        if next == SessionPhase::Done {
            self.phase_start = None;
            Ok(PhaseTransition::Finished { segment })
        } else {
            self.phase_start = Some(now);
            Ok(PhaseTransition::Advanced { segment, next })
        }
    }
}
