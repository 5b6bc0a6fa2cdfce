use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::db::records::{get_record, get_records_for_user, insert_record};
use crate::db::users::get_user;
use crate::db::MemoryStore;
use crate::ecg::analysis::{analyze_session, AnalysisSettings};
use crate::handlers::{error_response, ingest_error_status, store_error_status, validation_error_status};
use crate::models::common::ApiResponse;
use crate::models::record::{validate_segments, Record, RecordSummary, RecordUploadRequest, RecordsQuery, ValidationError};
use crate::utils::sample_filters::{retain_increasing, validate_samples};

/// Stores a finished session. Metrics and HRR are recomputed from the uploaded streams
/// rather than trusted from the client.
#[tracing::instrument(
    name = "Upload record",
    skip(upload, store, settings),
    fields(
        user_id = ?upload.user_id,
        ecg_samples = upload.ecg.len(),
        hr_samples = upload.hr.len()
    )
)]
pub async fn upload_record(
    upload: web::Json<RecordUploadRequest>,
    store: web::Data<MemoryStore>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    let RecordUploadRequest {
        user_id,
        datetime,
        mut ecg,
        mut hr,
        activity_segments,
        notes,
    } = upload.into_inner();

    let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            ValidationError::MissingField("user_id"),
        );
    };
    let user = match get_user(&store, &user_id).await {
        Ok(user) => user,
        Err(e) => return error_response(store_error_status(&e), "Unknown user", e),
    };

    if let Err(e) = validate_samples(&ecg).and_then(|_| validate_samples(&hr)) {
        return error_response(ingest_error_status(&e), "Invalid samples", e);
    }
    if let Err(e) = validate_segments(&activity_segments) {
        return error_response(validation_error_status(&e), "Invalid activity segments", e);
    }
    let dropped = retain_increasing(&mut ecg, None) + retain_increasing(&mut hr, None);
    if dropped > 0 {
        tracing::warn!("Dropped {} out-of-order samples from upload", dropped);
    }

    let analysis = analyze_session(&ecg, &hr, &activity_segments, &settings);
    let record = Record::new(
        user.user_name,
        datetime.unwrap_or_else(Utc::now),
        ecg,
        hr,
        activity_segments,
        analysis,
        notes,
    );
    let summary = RecordSummary::from(&record);
    let record_id = insert_record(&store, record).await;
    tracing::info!("Stored record {}", record_id);

    HttpResponse::Created().json(ApiResponse::success("Record stored", summary))
}

#[tracing::instrument(name = "List records", skip(query, store), fields(user_id = ?query.user_id))]
pub async fn list_records(query: web::Query<RecordsQuery>, store: web::Data<MemoryStore>) -> HttpResponse {
    let Some(user_id) = query.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "user_id is required",
            ValidationError::MissingField("user_id"),
        );
    };

    let records = get_records_for_user(&store, &user_id.to_lowercase()).await;
    HttpResponse::Ok().json(ApiResponse::success(format!("{} records", records.len()), records))
}

#[tracing::instrument(name = "Get record", skip(store))]
pub async fn get_record_by_id(record_id: Uuid, store: web::Data<MemoryStore>) -> HttpResponse {
    match get_record(&store, record_id).await {
        Ok(record) => HttpResponse::Ok().json(ApiResponse::success("Record found", record)),
        Err(e) => error_response(store_error_status(&e), "Record not found", e),
    }
}
