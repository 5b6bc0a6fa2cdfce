use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::db::MemoryStore;
use crate::ecg::analysis::AnalysisSettings;
use crate::handlers::session_handler::{
    advance_session_phase, create_recording_session, finish_recording_session, get_segment_metrics as get_segment_metrics_handler,
    get_session_status as get_session_status_handler, push_session_samples, simulate_session_samples,
    start_recording_session, CreateSessionRequest, FinishRequest, SamplesRequest, SimulateRequest, StatusQuery,
    TransitionRequest,
};
use crate::session::SessionSettings;

#[post("")]
async fn create_session(
    request: web::Json<CreateSessionRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
    session_settings: web::Data<SessionSettings>,
) -> HttpResponse {
    create_recording_session(request, store, analysis, session_settings).await
}

#[post("/{session_id}/start")]
async fn start_session(
    path: web::Path<Uuid>,
    request: Option<web::Json<TransitionRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    start_recording_session(path.into_inner(), request, store).await
}

#[post("/{session_id}/samples")]
async fn push_samples(
    path: web::Path<Uuid>,
    request: web::Json<SamplesRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
) -> HttpResponse {
    push_session_samples(path.into_inner(), request, store, analysis).await
}

#[post("/{session_id}/simulate")]
async fn simulate_samples(
    path: web::Path<Uuid>,
    request: web::Json<SimulateRequest>,
    store: web::Data<MemoryStore>,
    analysis: web::Data<AnalysisSettings>,
) -> HttpResponse {
    simulate_session_samples(path.into_inner(), request, store, analysis).await
}

#[post("/{session_id}/advance")]
async fn advance_phase(
    path: web::Path<Uuid>,
    request: Option<web::Json<TransitionRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    advance_session_phase(path.into_inner(), request, store).await
}

#[get("/{session_id}/segments/{activity_type}/metrics")]
async fn get_segment_metrics(
    path: web::Path<(Uuid, String)>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let (session_id, activity_type) = path.into_inner();
    get_segment_metrics_handler(session_id, activity_type, store).await
}

#[post("/{session_id}/finish")]
async fn finish_session(
    path: web::Path<Uuid>,
    request: Option<web::Json<FinishRequest>>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    finish_recording_session(path.into_inner(), request, store).await
}

#[get("/{session_id}")]
async fn get_session_status(
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    get_session_status_handler(path.into_inner(), query, store).await
}
