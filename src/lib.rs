use actix_web::{http, web, App, HttpServer};
use actix_web::dev::Server;
use tracing_actix_web::TracingLogger;
use std::net::TcpListener;
use actix_cors::Cors;

pub mod config;
pub mod db;
pub mod ecg;
mod handlers;
pub mod models;
mod routes;
pub mod sensor;
pub mod session;
pub mod telemetry;
pub mod utils;
use crate::db::MemoryStore;
use crate::ecg::analysis::AnalysisSettings;
use crate::routes::init_routes;
use crate::session::SessionSettings;

pub fn run(
    listener: TcpListener,
    store: MemoryStore,
    analysis_settings: AnalysisSettings,
    session_settings: SessionSettings,
) -> Result<Server, std::io::Error> {
    // Wrap using web::Data, which boils down to an Arc smart pointer
    let store = web::Data::new(store);
    let analysis_settings = web::Data::new(analysis_settings);
    let session_settings = web::Data::new(session_settings);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Sample uploads carry whole recordings
            .app_data(web::JsonConfig::default().limit(64 * 1024 * 1024))
            .app_data(store.clone())
            .app_data(analysis_settings.clone())
            .app_data(session_settings.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
