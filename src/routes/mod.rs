use actix_web::web;

pub mod analysis;
pub mod backend_health;
pub mod records;
pub mod sessions;
pub mod users;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health)
        .service(users::create_user)
        .service(users::get_user);

    cfg.service(
        web::scope("/records")
            .service(records::upload_record)
            .service(records::list_records)
            .service(records::get_record)
    );
    cfg.service(
        web::scope("/sessions")
            .service(sessions::create_session)
            .service(sessions::start_session)
            .service(sessions::push_samples)
            .service(sessions::simulate_samples)
            .service(sessions::advance_phase)
            .service(sessions::get_segment_metrics)
            .service(sessions::finish_session)
            .service(sessions::get_session_status)
    );
    cfg.service(
        web::scope("/analysis")
            .service(analysis::analyze_segment)
            .service(analysis::compare_sessions)
            .service(analysis::predict_recovery)
    );
}
