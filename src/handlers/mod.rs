pub mod analysis_handler;
pub mod backend_health_handler;
pub mod record_handler;
pub mod session_handler;
pub mod user_handler;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use crate::db::StoreError;
use crate::models::common::ApiResponse;
use crate::models::record::ValidationError;
use crate::sensor::IngestError;
use crate::session::SessionError;

/// Maps a failed operation onto the JSON error envelope.
pub(crate) fn error_response(status: StatusCode, message: &str, error: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::<()>::error_with_message(message, error.to_string()))
}

pub(crate) fn store_error_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::UserExists(_) => StatusCode::CONFLICT,
        StoreError::UserNotFound(_) | StoreError::SessionNotFound(_) | StoreError::RecordNotFound(_) => {
            StatusCode::NOT_FOUND
        }
    }
}

pub(crate) fn session_error_status(error: &SessionError) -> StatusCode {
    match error {
        SessionError::ClockWentBackwards { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::CONFLICT,
    }
}

pub(crate) fn ingest_error_status(error: &IngestError) -> StatusCode {
    match error {
        IngestError::SessionClosed => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

pub(crate) fn validation_error_status(_: &ValidationError) -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// Milliseconds since the epoch on the server clock.
pub(crate) fn server_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
