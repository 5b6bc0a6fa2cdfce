use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::db::records::insert_record;
use crate::db::sessions::{create_session, get_session};
use crate::db::users::get_user;
use crate::db::MemoryStore;
use crate::ecg::analysis::AnalysisSettings;
use crate::ecg::synthetic::{heart_rate_ramp, SyntheticEcg, MAX_SIMULATION_MS};
use crate::handlers::{
    error_response, ingest_error_status, server_time_ms, session_error_status, store_error_status,
};
use crate::models::common::ApiResponse;
use crate::models::ecg::{ActivityType, HeartRateSample, RawSample};
use crate::models::record::{RecordSummary, ValidationError};
use crate::sensor::{parse_ecg_frame, parse_heart_rate_measurement, stamp_ecg_frames, IngestError};
use crate::session::{PushOutcome, RecordingSession, SessionSettings};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
}

/// Optional client clock for transitions; the server clock is used when absent.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EcgFrameUpload {
    pub arrival: i64,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct HeartRateMeasurementUpload {
    pub timestamp: i64,
    pub data: Vec<u8>,
}

/// Decoded samples and raw sensor notifications may be mixed in one push.
#[derive(Debug, Default, Deserialize)]
pub struct SamplesRequest {
    #[serde(default)]
    pub ecg: Vec<RawSample>,
    #[serde(default)]
    pub hr: Vec<HeartRateSample>,
    #[serde(default)]
    pub ecg_frames: Vec<EcgFrameUpload>,
    #[serde(default)]
    pub hr_measurements: Vec<HeartRateMeasurementUpload>,
}

#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub ecg: PushOutcome,
    pub hr: PushOutcome,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub start: Option<i64>,
    pub duration_ms: i64,
    pub heart_rate_bpm: i32,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinishRequest {
    pub notes: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
}

#[tracing::instrument(name = "Create recording session", skip(request, store, analysis, session_settings))]
pub async fn create_recording_session(
    request: web::Json<CreateSessionRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
    session_settings: web::Data<SessionSettings>,
) -> HttpResponse {
    let Some(user_id) = request.user_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            ValidationError::MissingField("user_id"),
        );
    };
    let user = match get_user(&store, user_id).await {
        Ok(user) => user,
        Err(e) => return error_response(store_error_status(&e), "Unknown user", e),
    };

    let session = RecordingSession::new(&session_settings, analysis.get_ref().clone());
    let session_id = create_session(&store, user.user_name.clone(), session).await;
    tracing::info!("Created session {} for {}", session_id, user.user_name);

    HttpResponse::Created().json(ApiResponse::success(
        "Session created",
        json!({ "session_id": session_id, "user_id": user.user_name }),
    ))
}

#[tracing::instrument(name = "Start recording session", skip(request, store))]
pub async fn start_recording_session(
    session_id: Uuid,
    request: Option<web::Json<TransitionRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };
    let now = request.and_then(|r| r.timestamp).unwrap_or_else(server_time_ms);

    let mut entry = entry.lock().await;
    match entry.session.start(now) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::success("Session started", entry.session.status(now))),
        Err(e) => error_response(session_error_status(&e), "Failed to start session", e),
    }
}

/// Payloads decoded outside the session lock. ECG frames stay unstamped until the
/// session's newest timestamp is known.
struct DecodedPayloads {
    ecg: Vec<RawSample>,
    ecg_frames: Vec<(i64, Vec<i32>)>,
    hr: Vec<HeartRateSample>,
}

fn decode_sensor_payloads(request: SamplesRequest) -> Result<DecodedPayloads, IngestError> {
    let ecg_frames = request
        .ecg_frames
        .iter()
        .map(|frame| parse_ecg_frame(&frame.data).map(|values| (frame.arrival, values)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut hr = request.hr;
    for measurement in &request.hr_measurements {
        hr.push(HeartRateSample {
            timestamp: measurement.timestamp,
            value: parse_heart_rate_measurement(&measurement.data)? as i32,
        });
    }
    Ok(DecodedPayloads { ecg: request.ecg, ecg_frames, hr })
}

#[tracing::instrument(name = "Push session samples", skip(request, store, analysis))]
pub async fn push_session_samples(
    session_id: Uuid,
    request: web::Json<SamplesRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
) -> HttpResponse {
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };
    let DecodedPayloads { mut ecg, ecg_frames, hr } = match decode_sensor_payloads(request.into_inner()) {
        Ok(decoded) => decoded,
        Err(e) => return error_response(ingest_error_status(&e), "Malformed sensor data", e),
    };

    let mut entry = entry.lock().await;
    let previous = ecg
        .iter()
        .map(|s| s.timestamp)
        .max()
        .max(entry.session.last_ecg_timestamp());
    ecg.extend(stamp_ecg_frames(&ecg_frames, previous, analysis.sampling_rate_hz));

    let (ecg_outcome, hr_outcome) = match entry.session.push(ecg, hr) {
        Ok(outcomes) => outcomes,
        Err(e) => return error_response(ingest_error_status(&e), "Rejected samples", e),
    };

    HttpResponse::Ok().json(ApiResponse::success(
        "Samples accepted",
        SamplesResponse { ecg: ecg_outcome, hr: hr_outcome },
    ))
}

/// Test mode: feeds a synthetic ECG and a flat reported heart rate into the session.
#[tracing::instrument(name = "Simulate session samples", skip(request, store, analysis))]
pub async fn simulate_session_samples(
    session_id: Uuid,
    request: web::Json<SimulateRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
) -> HttpResponse {
    if !(1..=MAX_SIMULATION_MS).contains(&request.duration_ms) || !(1..=300).contains(&request.heart_rate_bpm) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid simulation parameters",
            format!(
                "duration_ms must be within 1..={} and heart_rate_bpm within 1..=300",
                MAX_SIMULATION_MS
            ),
        );
    }
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };

    let start = request.start.unwrap_or_else(server_time_ms);
    if start < 0 || start.checked_add(request.duration_ms).is_none() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid simulation parameters", "start is out of range");
    }
    let ecg = SyntheticEcg::new(
        analysis.sampling_rate_hz,
        request.heart_rate_bpm as f64,
        request.seed.unwrap_or(0),
    )
    .samples(start, request.duration_ms);
    let hr = heart_rate_ramp(start, request.duration_ms, request.heart_rate_bpm, request.heart_rate_bpm);

    let mut entry = entry.lock().await;
    let (ecg_outcome, hr_outcome) = match entry.session.push(ecg, hr) {
        Ok(outcomes) => outcomes,
        Err(e) => return error_response(ingest_error_status(&e), "Rejected simulated samples", e),
    };
    tracing::info!("Simulated {} ms at {} bpm", request.duration_ms, request.heart_rate_bpm);

    HttpResponse::Ok().json(ApiResponse::success(
        "Simulated samples accepted",
        SamplesResponse { ecg: ecg_outcome, hr: hr_outcome },
    ))
}

#[tracing::instrument(name = "Advance session phase", skip(request, store))]
pub async fn advance_session_phase(
    session_id: Uuid,
    request: Option<web::Json<TransitionRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };
    let now = request.and_then(|r| r.timestamp).unwrap_or_else(server_time_ms);

    let mut entry = entry.lock().await;
    match entry.session.advance(now) {
        Ok(transition) => HttpResponse::Ok().json(ApiResponse::success(
            "Phase transition applied",
            json!({ "transition": transition, "status": entry.session.status(now) }),
        )),
        Err(e) => error_response(session_error_status(&e), "Cannot advance phase", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub timestamp: Option<i64>,
}

#[tracing::instrument(name = "Get session status", skip(query, store))]
pub async fn get_session_status(
    session_id: Uuid,
    query: web::Query<StatusQuery>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };
    let now = query.timestamp.unwrap_or_else(server_time_ms);

    let entry = entry.lock().await;
    HttpResponse::Ok().json(ApiResponse::success(
        "Session status",
        json!({
            "user_id": entry.user_id,
            "record_id": entry.record_id,
            "status": entry.session.status(now),
        }),
    ))
}

#[tracing::instrument(name = "Get segment metrics", skip(store))]
pub async fn get_segment_metrics(
    session_id: Uuid,
    activity_type: String,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let activity_type: ActivityType = match activity_type.parse() {
        Ok(activity_type) => activity_type,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Unknown activity type", e),
    };
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };

    let entry = entry.lock().await;
    match entry.session.segment_metrics(activity_type) {
        Some(metrics) => HttpResponse::Ok().json(ApiResponse::success("Segment metrics", metrics)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error(format!(
            "No closed {} segment yet",
            activity_type
        ))),
    }
}

#[tracing::instrument(name = "Finish recording session", skip(request, store))]
pub async fn finish_recording_session(
    session_id: Uuid,
    request: Option<web::Json<FinishRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let entry = match get_session(&store, session_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(store_error_status(&e), "Session not found", e),
    };
    let request = request.map(|r| r.into_inner()).unwrap_or_default();

    let mut entry = entry.lock().await;
    if let Some(record_id) = entry.record_id {
        return HttpResponse::Conflict().json(ApiResponse::<()>::error(format!(
            "Session already stored as record {}",
            record_id
        )));
    }

    let record = match entry.session.finish(
        entry.user_id.clone(),
        request.notes,
        request.datetime.unwrap_or_else(Utc::now),
    ) {
        Ok(record) => record,
        Err(e) => return error_response(session_error_status(&e), "Session is not finished", e),
    };
    let summary = RecordSummary::from(&record);
    let record_id = insert_record(&store, record).await;
    entry.record_id = Some(record_id);
    tracing::info!("Session {} stored as record {}", session_id, record_id);

    HttpResponse::Created().json(ApiResponse::success("Record stored", summary))
}
