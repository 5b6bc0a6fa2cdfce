use reqwest::Client;
use serde_json::json;

use cardiolog_backend::ecg::synthetic::{heart_rate_ramp, SyntheticEcg};
use cardiolog_backend::models::ecg::RawSample;

mod common;
use common::utils::{post_json, spawn_app};

/// One sample every 100 ms alternating around `mean` by `spread`.
fn block(start: i64, seconds: i64, mean: f64, spread: f64) -> Vec<RawSample> {
    (0..seconds * 10)
        .map(|i| RawSample {
            timestamp: start + i * 100,
            value: mean + if i % 2 == 0 { spread } else { -spread },
        })
        .collect()
}

#[tokio::test]
async fn analyze_segment_working() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let (status, body) = post_json(
        &client,
        &format!("{}/analysis/segment", &test_app.address),
        &json!({
            "ecg": SyntheticEcg::new(130.0, 75.0, 9).samples(0, 60_000),
            "hr": heart_rate_ramp(0, 60_000, 75, 75),
            "segment": { "type": "exercise", "start": 10_000, "end": 40_000 }
        }),
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    let data = &body["data"];
    assert_eq!(data["metrics"]["avgHeartRate"], 75);
    assert_eq!(data["metrics"]["duration"], 30_000);
    assert_eq!(data["heart_rate"]["count"], 31);
    assert_eq!(data["signal_quality"], "excellent");

    let peaks = data["metrics"]["rPeaks"].as_array().expect("peaks");
    assert!(peaks.iter().all(|p| (10_000..=40_000).contains(&p.as_i64().unwrap())));
    assert!(peaks.len() >= 30, "found {} peaks", peaks.len());
}

#[tokio::test]
async fn analyze_segment_of_noise_is_poor() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let (status, body) = post_json(
        &client,
        &format!("{}/analysis/segment", &test_app.address),
        &json!({ "ecg": block(0, 10, 0.0, 2_000.0) }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["signal_quality"], "poor");
    assert_eq!(body["data"]["heart_rate"], serde_json::Value::Null);
}

#[tokio::test]
async fn analyze_segment_rejects_invalid_samples() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let (status, _) = post_json(
        &client,
        &format!("{}/analysis/segment", &test_app.address),
        &json!({ "ecg": [{ "timestamp": -10, "value": 1.0 }] }),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn compare_sessions_working() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let (status, body) = post_json(
        &client,
        &format!("{}/analysis/compare", &test_app.address),
        &json!({
            "baseline": { "hr": heart_rate_ramp(0, 60_000, 60, 60) },
            "current": { "hr": heart_rate_ramp(0, 60_000, 90, 90) }
        }),
    )
    .await;

    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["average_baseline_hr"], 60.0);
    assert_eq!(data["average_session_hr"], 90.0);
    assert_eq!(data["difference"], 30.0);
    // Without ECG there is no HRV on either side
    assert_eq!(data["hrv_change"], 0.0);
}

#[tokio::test]
async fn recovery_periods_follow_calibration() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let mut samples = block(0, 60, 100.0, 60.0);
    samples.extend(block(60_000, 90, 100.0, 10.0));

    let (status, body) = post_json(
        &client,
        &format!("{}/analysis/recovery_periods", &test_app.address),
        &json!({
            "calibration": block(0, 30, 100.0, 10.0),
            "samples": samples
        }),
    )
    .await;

    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["base_metrics"]["mean"], 100.0);
    let periods = data["recovery_periods"].as_array().expect("periods");
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0]["start"], 60_000);
}

#[tokio::test]
async fn recovery_periods_need_calibration() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let (status, _) = post_json(
        &client,
        &format!("{}/analysis/recovery_periods", &test_app.address),
        &json!({ "calibration": [], "samples": block(0, 60, 100.0, 10.0) }),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn recovery_periods_reject_out_of_range_windows() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/analysis/recovery_periods", &test_app.address);

    for options in [
        json!({ "window_ms": 0 }),
        json!({ "step_ms": 1 }),
        json!({ "window_ms": i64::MAX }),
        json!({ "step_ms": 3_600_001 }),
    ] {
        let mut request = json!({
            "calibration": block(0, 30, 100.0, 10.0),
            "samples": block(1_000, 60, 100.0, 10.0)
        });
        for (key, value) in options.as_object().expect("options object") {
            request[key] = value.clone();
        }
        let (status, body) = post_json(&client, &url, &request).await;
        assert_eq!(status, 400, "options {} gave {}", options, body);
        assert_eq!(body["message"], "Invalid prediction options");
    }
}
