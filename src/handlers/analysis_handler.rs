use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::ecg::analysis::{analyze_segment, AnalysisSettings};
use crate::ecg::calibration::{predict_recovery_periods, BaseMetrics, PredictionOptions};
use crate::ecg::comparison::{compare_sessions, ComparisonInput};
use crate::handlers::{error_response, ingest_error_status};
use crate::models::common::ApiResponse;
use crate::models::ecg::{ActivitySegment, HeartRateSample, RawSample};
use crate::utils::sample_filters::{retain_increasing, validate_samples};

#[derive(Debug, Deserialize)]
pub struct SegmentAnalysisRequest {
    #[serde(default)]
    pub ecg: Vec<RawSample>,
    #[serde(default)]
    pub hr: Vec<HeartRateSample>,
    /// Restricts both streams to this window when present.
    pub segment: Option<ActivitySegment>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonRequest {
    pub baseline: ComparisonInput,
    pub current: ComparisonInput,
}

#[derive(Debug, Deserialize)]
pub struct RecoveryPredictionRequest {
    pub calibration: Vec<RawSample>,
    pub samples: Vec<RawSample>,
    pub window_ms: Option<i64>,
    pub step_ms: Option<i64>,
    pub similarity_threshold: Option<f64>,
}

/// Pull-based metrics for an arbitrary slice, recomputed on every call.
#[tracing::instrument(
    name = "Analyze segment",
    skip(request, settings),
    fields(ecg_samples = request.ecg.len(), hr_samples = request.hr.len())
)]
pub async fn analyze_segment_request(
    request: web::Json<SegmentAnalysisRequest>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    let SegmentAnalysisRequest { mut ecg, mut hr, segment } = request.into_inner();
    if let Err(e) = validate_samples(&ecg).and_then(|_| validate_samples(&hr)) {
        return error_response(ingest_error_status(&e), "Invalid samples", e);
    }
    retain_increasing(&mut ecg, None);
    retain_increasing(&mut hr, None);

    let (ecg, hr) = match segment {
        Some(segment) => (segment.slice(&ecg), segment.slice(&hr)),
        None => (ecg, hr),
    };
    let analysis = analyze_segment(&ecg, &hr, &settings);
    HttpResponse::Ok().json(ApiResponse::success("Segment analyzed", analysis))
}

#[tracing::instrument(name = "Compare sessions", skip(request, settings))]
pub async fn compare_sessions_request(
    request: web::Json<ComparisonRequest>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    let comparison = compare_sessions(&request.baseline, &request.current, &settings.metrics_config());
    HttpResponse::Ok().json(ApiResponse::success("Sessions compared", comparison))
}

#[tracing::instrument(
    name = "Predict recovery periods",
    skip(request),
    fields(calibration_samples = request.calibration.len(), samples = request.samples.len())
)]
pub async fn predict_recovery_request(request: web::Json<RecoveryPredictionRequest>) -> HttpResponse {
    let RecoveryPredictionRequest { calibration, mut samples, window_ms, step_ms, similarity_threshold } =
        request.into_inner();

    let defaults = PredictionOptions::default();
    let options = PredictionOptions {
        window_ms: window_ms.unwrap_or(defaults.window_ms),
        step_ms: step_ms.unwrap_or(defaults.step_ms),
        similarity_threshold: similarity_threshold.unwrap_or(defaults.similarity_threshold),
    };
    if let Err(e) = options.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid prediction options", e);
    }
    if let Err(e) = validate_samples(&calibration).and_then(|_| validate_samples(&samples)) {
        return error_response(ingest_error_status(&e), "Invalid samples", e);
    }

    let Some(base) = BaseMetrics::from_samples(&calibration) else {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Calibration recording is empty"));
    };
    retain_increasing(&mut samples, None);
    let periods = predict_recovery_periods(&samples, &base, &options);

    HttpResponse::Ok().json(ApiResponse::success(
        format!("{} recovery periods", periods.len()),
        json!({ "base_metrics": base, "recovery_periods": periods }),
    ))
}
