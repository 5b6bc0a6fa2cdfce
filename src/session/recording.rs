use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ecg::analysis::{analyze_session, summarize_heart_rate, AnalysisSettings};
use crate::ecg::metrics::compute_metrics;
use crate::ecg::recovery_tracker::{RecoveryState, RecoveryTracker};
use crate::ecg::signal_quality::SignalQualityScorer;
use crate::models::ecg::{
    ActivitySegment, ActivityType, EcgMetrics, HeartRateSample, RawSample, SignalQualityRating, Timestamped,
};
use crate::models::record::Record;
use crate::sensor::IngestError;
use crate::session::phase::{PhaseSegmenter, PhaseTransition, SessionPhase};
use crate::session::{SessionError, SessionSettings};
use crate::utils::sample_filters::{retain_increasing, validate_samples};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub accepted: usize,
    /// Duplicate or out-of-order samples
    pub dropped: usize,
    /// Oldest samples pushed out of the bounded buffer
    pub evicted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub phase_started_at: Option<i64>,
    pub elapsed_ms: i64,
    pub required_ms: i64,
    pub can_advance: bool,
    pub segments: Vec<ActivitySegment>,
    pub ecg_samples: usize,
    pub hr_samples: usize,
    pub dropped_samples: usize,
    pub evicted_samples: usize,
    pub signal_quality: SignalQualityRating,
    pub recovery: RecoveryState,
}

/// Owns everything recorded during one session: the phase state machine and the bounded,
/// append-only sample buffers it partitions.
#[derive(Debug)]
pub struct RecordingSession {
    segmenter: PhaseSegmenter,
    analysis: AnalysisSettings,
    ecg: VecDeque<RawSample>,
    hr: VecDeque<HeartRateSample>,
    max_ecg_samples: usize,
    max_hr_samples: usize,
    dropped_samples: usize,
    evicted_samples: usize,
    recovery: RecoveryTracker,
}

/// Samples of a sorted buffer that fall inside `segment`, bounds included.
fn slice_buffer<T: Timestamped + Copy>(buffer: &VecDeque<T>, segment: &ActivitySegment) -> Vec<T> {
    let lo = buffer.partition_point(|s| s.timestamp() < segment.start);
    let hi = buffer.partition_point(|s| s.timestamp() <= segment.end);
    buffer.range(lo..hi.max(lo)).copied().collect()
}

/// Appends samples that already passed validation.
fn append_bounded<T: Timestamped + Copy>(
    buffer: &mut VecDeque<T>,
    mut samples: Vec<T>,
    capacity: usize,
    stream: &str,
) -> PushOutcome {
    let dropped = retain_increasing(&mut samples, buffer.back().map(|s| s.timestamp()));
    let accepted = samples.len();
    buffer.extend(samples);

    let mut evicted = 0;
    while buffer.len() > capacity {
        buffer.pop_front();
        evicted += 1;
    }
    if evicted > 0 {
        tracing::warn!("{} buffer full, evicted {} oldest samples", stream, evicted);
    }
    if dropped > 0 {
        tracing::debug!("Dropped {} out-of-order {} samples", dropped, stream);
    }
    PushOutcome { accepted, dropped, evicted }
}

impl RecordingSession {
    pub fn new(settings: &SessionSettings, analysis: AnalysisSettings) -> Self {
        Self {
            segmenter: PhaseSegmenter::new(settings.phase_minimums.into(), settings.rest_settling_ms),
            analysis,
            ecg: VecDeque::new(),
            hr: VecDeque::new(),
            max_ecg_samples: settings.max_ecg_samples.max(1),
            max_hr_samples: settings.max_hr_samples.max(1),
            dropped_samples: 0,
            evicted_samples: 0,
            recovery: RecoveryTracker::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.segmenter.phase()
    }

    pub fn segments(&self) -> &[ActivitySegment] {
        self.segmenter.segments()
    }

    pub fn start(&mut self, now: i64) -> Result<(), SessionError> {
        self.segmenter.start(now)
    }

    fn ensure_open(&self) -> Result<(), IngestError> {
        if self.segmenter.phase() == SessionPhase::Done {
            return Err(IngestError::SessionClosed);
        }
        Ok(())
    }

    fn append_ecg(&mut self, samples: Vec<RawSample>) -> PushOutcome {
        let outcome = append_bounded(&mut self.ecg, samples, self.max_ecg_samples, "ECG");
        self.dropped_samples += outcome.dropped;
        self.evicted_samples += outcome.evicted;
        outcome
    }

    /// Accepted samples also feed the live recovery tracker.
    fn append_heart_rate(&mut self, samples: Vec<HeartRateSample>) -> PushOutcome {
        let outcome = append_bounded(&mut self.hr, samples, self.max_hr_samples, "Heart rate");
        self.dropped_samples += outcome.dropped;
        self.evicted_samples += outcome.evicted;

        let fresh = self.hr.len().min(outcome.accepted);
        for sample in self.hr.iter().skip(self.hr.len() - fresh) {
            self.recovery.observe(*sample);
        }
        outcome
    }

    pub fn push_ecg(&mut self, samples: Vec<RawSample>) -> Result<PushOutcome, IngestError> {
        self.ensure_open()?;
        validate_samples(&samples)?;
        Ok(self.append_ecg(samples))
    }

    pub fn push_heart_rate(&mut self, samples: Vec<HeartRateSample>) -> Result<PushOutcome, IngestError> {
        self.ensure_open()?;
        validate_samples(&samples)?;
        Ok(self.append_heart_rate(samples))
    }

    /// Both batches are validated before either is stored; a rejected push leaves the
    /// session untouched.
    pub fn push(
        &mut self,
        ecg: Vec<RawSample>,
        hr: Vec<HeartRateSample>,
    ) -> Result<(PushOutcome, PushOutcome), IngestError> {
        self.ensure_open()?;
        validate_samples(&ecg)?;
        validate_samples(&hr)?;
        Ok((self.append_ecg(ecg), self.append_heart_rate(hr)))
    }

    pub fn last_ecg_timestamp(&self) -> Option<i64> {
        self.ecg.back().map(|s| s.timestamp)
    }

    pub fn can_advance(&self, now: i64) -> bool {
        self.segmenter.can_advance(now)
    }

    /// Closing rest also sets the recovery tracker's baseline to the mean rest heart rate.
    pub fn advance(&mut self, now: i64) -> Result<PhaseTransition, SessionError> {
        let transition = self.segmenter.advance(now)?;
        if let PhaseTransition::Advanced { segment, .. } = &transition {
            if segment.activity_type == ActivityType::Rest {
                if let Some(summary) = summarize_heart_rate(&slice_buffer(&self.hr, segment)) {
                    self.recovery.set_baseline(summary.mean, now);
                }
            }
        }
        Ok(transition)
    }

    pub fn recovery(&self) -> &RecoveryState {
        self.recovery.state()
    }

    /// Snapshot of the ECG buffer as it stands.
    pub fn ecg(&self) -> Vec<RawSample> {
        self.ecg.iter().copied().collect()
    }

    pub fn heart_rate(&self) -> Vec<HeartRateSample> {
        self.hr.iter().copied().collect()
    }

    /// Quality of the most recent signal. Only the scorer's recent window is copied out
    /// of the buffer.
    pub fn live_quality(&self) -> SignalQualityRating {
        let scorer = self.analysis.quality_scorer();
        let take = scorer.recent_samples().unwrap_or(self.ecg.len()).min(self.ecg.len());
        let recent: Vec<RawSample> = self.ecg.range(self.ecg.len() - take..).copied().collect();
        scorer.score(&recent)
    }

    /// Metrics of a closed segment, recomputed from its sample slice. `None` until the
    /// segment exists.
    pub fn segment_metrics(&self, activity_type: ActivityType) -> Option<EcgMetrics> {
        let segment = self
            .segments()
            .iter()
            .find(|segment| segment.activity_type == activity_type)?;
        let ecg = slice_buffer(&self.ecg, segment);
        let hr = slice_buffer(&self.hr, segment);
        Some(compute_metrics(&ecg, &hr, &self.analysis.metrics_config()))
    }

    pub fn status(&self, now: i64) -> SessionStatus {
        SessionStatus {
            phase: self.segmenter.phase(),
            phase_started_at: self.segmenter.phase_start(),
            elapsed_ms: self.segmenter.elapsed_ms(now),
            required_ms: self.segmenter.required_ms(),
            can_advance: self.segmenter.can_advance(now),
            segments: self.segments().to_vec(),
            ecg_samples: self.ecg.len(),
            hr_samples: self.hr.len(),
            dropped_samples: self.dropped_samples,
            evicted_samples: self.evicted_samples,
            signal_quality: self.live_quality(),
            recovery: self.recovery.state().clone(),
        }
    }

    /// Assembles the stored record. Only possible once recovery has been closed.
    pub fn finish(
        &self,
        user_id: String,
        notes: Option<String>,
        datetime: DateTime<Utc>,
    ) -> Result<Record, SessionError> {
        let phase = self.segmenter.phase();
        if phase != SessionPhase::Done {
            return Err(SessionError::Incomplete(phase));
        }

        let ecg = self.ecg();
        let hr = self.heart_rate();
        let segments = self.segments().to_vec();
        let analysis = analyze_session(&ecg, &hr, &segments, &self.analysis);
        tracing::info!(
            "Finished session for {}: {} segments, {} HRR points",
            user_id,
            segments.len(),
            analysis.hrr_points.len()
        );
        Ok(Record::new(user_id, datetime, ecg, hr, segments, analysis, notes))
    }
}
