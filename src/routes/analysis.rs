use actix_web::{post, web, HttpResponse};

use crate::ecg::analysis::AnalysisSettings;
use crate::handlers::analysis_handler::{
    analyze_segment_request, compare_sessions_request, predict_recovery_request, ComparisonRequest,
    RecoveryPredictionRequest, SegmentAnalysisRequest,
};

#[post("/segment")]
async fn analyze_segment(
    request: web::Json<SegmentAnalysisRequest>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    analyze_segment_request(request, settings).await
}

#[post("/compare")]
async fn compare_sessions(
    request: web::Json<ComparisonRequest>,
    settings: web::Data<AnalysisSettings>,
) -> HttpResponse {
    compare_sessions_request(request, settings).await
}

#[post("/recovery_periods")]
async fn predict_recovery(request: web::Json<RecoveryPredictionRequest>) -> HttpResponse {
    predict_recovery_request(request).await
}
