use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::db::MemoryStore;

pub async fn backend_health_check(store: web::Data<MemoryStore>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store.counts().await
    }))
}
