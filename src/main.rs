use std::net::TcpListener;

use cardiolog_backend::run;
use cardiolog_backend::config::settings::get_config;
use cardiolog_backend::db::MemoryStore;
use cardiolog_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "cardiolog-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    tracing::info!(
        "Analysis at {} Hz, heart rate from {:?}, phase minimums {:?}",
        config.analysis.sampling_rate_hz,
        config.analysis.heart_rate_source,
        config.session.phase_minimums
    );

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    run(
        listener,
        MemoryStore::new(),
        config.analysis,
        config.session
    )?.await
}
