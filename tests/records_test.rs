use reqwest::Client;
use serde_json::{json, Value};

use cardiolog_backend::ecg::synthetic::{heart_rate_ramp, SyntheticEcg};
use cardiolog_backend::models::ecg::HeartRateSample;

mod common;
use common::utils::{create_test_user, post_json, spawn_app};

fn session_payload(user_id: &str, datetime: &str) -> Value {
    let ecg = SyntheticEcg::new(130.0, 60.0, 3).samples(0, 100_000);
    let mut hr: Vec<HeartRateSample> = heart_rate_ramp(0, 20_000, 60, 60);
    hr.extend(heart_rate_ramp(21_000, 19_000, 100, 150));
    hr.extend(heart_rate_ramp(41_000, 59_000, 140, 90));

    json!({
        "user_id": user_id,
        "datetime": datetime,
        "ecg": ecg,
        "hr": hr,
        "activity_segments": [
            { "type": "rest", "start": 10_000, "end": 20_000 },
            { "type": "exercise", "start": 20_000, "end": 40_000 },
            { "type": "recovery", "start": 40_000, "end": 100_000 }
        ],
        "notes": "interval session"
    })
}

#[tokio::test]
async fn upload_record_working() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user_name = create_test_user(&test_app.address).await;

    let (status, body) = post_json(
        &client,
        &format!("{}/records", &test_app.address),
        &session_payload(&user_name, "2026-03-01T10:00:00Z"),
    )
    .await;

    assert_eq!(status, 201, "unexpected body: {}", body);
    let data = &body["data"];
    assert_eq!(data["user_id"], user_name.as_str());
    assert_eq!(data["ecg_samples"], 13_000);
    assert_eq!(data["activity_segments"].as_array().map(Vec::len), Some(3));
    assert_eq!(data["rest_metrics"]["avgHeartRate"], 60);
    assert_eq!(data["exercise_metrics"]["maxHeartRate"], 150);
    assert_eq!(data["notes"], "interval session");

    // Recovery starts at 40 s and ends at 100 s: offsets 0, 30 and 60 s
    let hrr_points = data["hrr_points"].as_array().expect("hrr_points is an array");
    assert_eq!(hrr_points.len(), 3);
    assert_eq!(hrr_points[0], json!({ "time": 0.0, "hr": 150, "hrr": 0 }));
    assert_eq!(hrr_points[2]["time"], 60.0);
}

#[tokio::test]
async fn upload_record_requires_known_user() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/records", &test_app.address);

    let mut missing_user = session_payload("placeholder", "2026-03-01T10:00:00Z");
    missing_user.as_object_mut().unwrap().remove("user_id");
    let (status, body) = post_json(&client, &url, &missing_user).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap_or_default().contains("user_id"));

    let unknown_user = session_payload("ghost", "2026-03-01T10:00:00Z");
    let (status, _) = post_json(&client, &url, &unknown_user).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn upload_record_rejects_invalid_segments() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user_name = create_test_user(&test_app.address).await;
    let url = format!("{}/records", &test_app.address);

    let invalid_segments = vec![
        json!([{ "type": "rest", "start": 20_000, "end": 10_000 }]),
        json!([
            { "type": "exercise", "start": 0, "end": 10_000 },
            { "type": "rest", "start": 10_000, "end": 20_000 }
        ]),
        json!([
            { "type": "rest", "start": 0, "end": 15_000 },
            { "type": "exercise", "start": 10_000, "end": 20_000 }
        ]),
    ];

    for segments in invalid_segments {
        let mut payload = session_payload(&user_name, "2026-03-01T10:00:00Z");
        payload["activity_segments"] = segments.clone();
        let (status, _) = post_json(&client, &url, &payload).await;
        assert_eq!(status, 400, "segments {} were accepted", segments);
    }
}

#[tokio::test]
async fn upload_record_rejects_negative_timestamps() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user_name = create_test_user(&test_app.address).await;

    let mut payload = session_payload(&user_name, "2026-03-01T10:00:00Z");
    payload["hr"] = json!([{ "timestamp": -1000, "value": 60 }]);
    let (status, _) = post_json(&client, &format!("{}/records", &test_app.address), &payload).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn list_records_newest_first() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user_name = create_test_user(&test_app.address).await;
    let url = format!("{}/records", &test_app.address);

    for datetime in ["2026-01-01T08:00:00Z", "2026-02-01T08:00:00Z"] {
        let (status, _) = post_json(&client, &url, &session_payload(&user_name, datetime)).await;
        assert_eq!(status, 201);
    }

    let response = client
        .get(&url)
        .query(&[("user_id", user_name.as_str())])
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse response body.");
    let records = body["data"].as_array().expect("data is an array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["datetime"], "2026-02-01T08:00:00Z");
    assert_eq!(records[1]["datetime"], "2026-01-01T08:00:00Z");
    assert_eq!(records[0]["ecg"].as_array().map(Vec::len), Some(13_000));
}

#[tokio::test]
async fn list_records_requires_user_id() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/records", &test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn get_record_by_id_working() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user_name = create_test_user(&test_app.address).await;

    let (status, body) = post_json(
        &client,
        &format!("{}/records", &test_app.address),
        &session_payload(&user_name, "2026-03-01T10:00:00Z"),
    )
    .await;
    assert_eq!(status, 201);
    let record_id = body["data"]["id"].as_str().expect("record id").to_string();

    let response = client
        .get(&format!("{}/records/{}", &test_app.address, record_id))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse response body.");
    assert_eq!(body["data"]["id"], record_id.as_str());
    assert_eq!(body["data"]["hr"].as_array().map(Vec::len), Some(21 + 20 + 60));

    let response = client
        .get(&format!("{}/records/{}", &test_app.address, uuid::Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 404);
}
