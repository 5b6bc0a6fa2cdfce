use actix_web::{get, web, Responder};

use crate::db::MemoryStore;
use crate::handlers::backend_health_handler::backend_health_check;

#[get("/backend_health")]
async fn backend_health(store: web::Data<MemoryStore>) -> impl Responder {
    backend_health_check(store).await
}
