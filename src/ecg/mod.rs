pub mod analysis;
pub mod calibration;
pub mod comparison;
pub mod hrr;
pub mod metrics;
pub mod peak_detection;
pub mod recovery_tracker;
pub mod rr_intervals;
pub mod signal_quality;
pub mod stats;
pub mod synthetic;

pub use analysis::{analyze_segment, analyze_session, AnalysisSettings, SegmentAnalysis, SessionAnalysis};
pub use hrr::compute_hrr;
pub use metrics::{compute_metrics, HeartRateSource, MetricsConfig};
pub use peak_detection::{detect_peaks, PeakDetector, ThresholdStrategy};
pub use rr_intervals::{filter_artifacts, rr_intervals};
pub use signal_quality::{score_quality, DispersionScorer, QualityPreset, SignalQualityScorer};
