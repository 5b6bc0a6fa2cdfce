use std::net::TcpListener;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use cardiolog_backend::run;
use cardiolog_backend::config::settings::get_config;
use cardiolog_backend::db::MemoryStore;
use cardiolog_backend::session::PhaseMinimumsPreset;
use cardiolog_backend::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: MemoryStore,
}

pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    let mut configuration = get_config().expect("Failed to read configuration.");
    configuration.session.phase_minimums = PhaseMinimumsPreset::Testing;

    let store = MemoryStore::new();
    let server = run(
        listener,
        store.clone(),
        configuration.analysis,
        configuration.session
    )
        .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);
    TestApp {
        address,
        store
    }
}

/// Registers a fresh user and returns its (lower-case) name.
pub async fn create_test_user(app_address: &str) -> String {
    let client = Client::new();
    let user_name = format!("user{}", Uuid::new_v4().simple());

    let response = client
        .post(&format!("{}/users", app_address))
        .json(&json!({
            "user_name": user_name,
            "birth_year": 1990,
            "gender": "female"
        }))
        .send()
        .await
        .expect("Failed to create user.");
    assert_eq!(response.status().as_u16(), 201);

    user_name
}

pub async fn post_json(client: &Client, url: &str, body: &Value) -> (u16, Value) {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .expect("Failed to execute request.");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse response body.");
    (status, body)
}
