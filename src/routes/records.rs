use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::db::MemoryStore;
use crate::ecg::analysis::AnalysisSettings;
use crate::handlers::record_handler::{get_record_by_id, list_records as list_records_handler, upload_record as upload_record_handler};
use crate::models::record::{RecordUploadRequest, RecordsQuery};

#[post("")]
async fn upload_record(
    upload: web::Json<RecordUploadRequest>,
    store: web::Data<MemoryStore>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    upload_record_handler(upload, store, settings).await
}

#[get("")]
async fn list_records(query: web::Query<RecordsQuery>, store: web::Data<MemoryStore>) -> HttpResponse {
    list_records_handler(query, store).await
}

#[get("/{record_id}")]
async fn get_record(path: web::Path<Uuid>, store: web::Data<MemoryStore>) -> HttpResponse {
    get_record_by_id(path.into_inner(), store).await
}
