use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::{create_router, AppState};

fn app_with(config: Config) -> Router {
    create_router(AppState::from_config(config).unwrap())
}

fn app() -> Router {
    app_with(Config::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, key: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ============================================================================
// VERIFY
// ============================================================================

#[tokio::test]
async fn test_verify_blocks_bot_like_order() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({
            "typing_speed": 450,
            "time_on_page": 2,
            "payment_type": "credit card",
            "field_focus_durations": {}
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], "block");
    assert!(body["reason"].as_str().unwrap().contains("classifier"));
    assert_eq!(body["details"]["detector_consulted"], true);
}

#[tokio::test]
async fn test_verify_allows_human_order() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({
            "typing_speed": 180,
            "time_on_page": 95,
            "payment_type": "Cash on Delivery",
            "user_id": "u-1001"
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], "allow");
    assert_eq!(body["reason"], "verification successful");
}

#[tokio::test]
async fn test_verify_rejects_missing_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({ "typing_speed": 180, "payment_type": "paytm" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "time_on_page");
}

#[tokio::test]
async fn test_verify_rejects_unknown_payment_type() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({ "typing_speed": 180, "time_on_page": 30, "payment_type": "barter" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "payment_type");
}

#[tokio::test]
async fn test_verify_rejects_non_numeric_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({ "typing_speed": "fast", "time_on_page": 30, "payment_type": "paytm" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

// ============================================================================
// ACCURACY CONTROL
// ============================================================================

#[tokio::test]
async fn test_accuracy_control_round_trip() {
    let app = app();
    let settings = json!({
        "enabled": true,
        "target_accuracy": 0.75,
        "noise_factor": 0.2,
        "bias_factor": 0.15
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/accuracy-control", Some(settings.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, settings);

    let (status, body) = send(&app, Method::GET, "/api/v1/accuracy-control", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, settings);
}

#[tokio::test]
async fn test_accuracy_control_rejects_out_of_range() {
    let app = app();
    let (_, before) = send(&app, Method::GET, "/api/v1/accuracy-control", None, None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/accuracy-control",
        Some(json!({ "target_accuracy": 0.96 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "target_accuracy");

    let (_, after) = send(&app, Method::GET, "/api/v1/accuracy-control", None, None).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_accuracy_control_rejects_partial_write() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/accuracy-control",
        Some(json!({ "enabled": true, "target_accuracy": 0.8 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "noise_factor");
}

#[tokio::test]
async fn test_control_key_required_when_configured() {
    let config = Config {
        control_api_key: Some("op-key".to_string()),
        ..Config::default()
    };
    let app = app_with(config);
    let settings = json!({
        "enabled": false,
        "target_accuracy": 0.9,
        "noise_factor": 0.0,
        "bias_factor": 0.0
    });

    let (status, _) = send(&app, Method::POST, "/api/v1/accuracy-control", Some(settings.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/v1/accuracy-control", Some(settings.clone()), Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::POST, "/api/v1/accuracy-control", Some(settings.clone()), Some("op-key")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, settings);

    // Reads stay open
    let (status, _) = send(&app, Method::GET, "/api/v1/accuracy-control", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_production_without_key_refuses_writes() {
    let config = Config {
        environment: "production".to_string(),
        ..Config::default()
    };
    let app = app_with(config);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/accuracy-control",
        Some(json!({ "enabled": false, "target_accuracy": 0.9, "noise_factor": 0.0, "bias_factor": 0.0 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// EVALUATION, INFO, STATS
// ============================================================================

#[tokio::test]
async fn test_evaluate_reports_metrics() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/accuracy/evaluate",
        Some(json!({
            "samples": [
                { "typing_speed": 470, "time_on_page": 2, "payment_type": "credit card", "is_fraud": true },
                { "typing_speed": 150, "time_on_page": 90, "payment_type": "paytm", "is_fraud": false }
            ]
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accuracy"], 1.0);
    assert_eq!(body["total_samples"], 2);
    assert_eq!(body["confusion_matrix"]["true_positives"], 1);
}

#[tokio::test]
async fn test_evaluate_names_bad_sample() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/accuracy/evaluate",
        Some(json!({
            "samples": [
                { "typing_speed": 150, "time_on_page": 90, "payment_type": "paytm", "is_fraud": false },
                { "typing_speed": 150, "time_on_page": -4, "payment_type": "paytm", "is_fraud": false }
            ]
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "samples[1].time_on_page");
}

#[tokio::test]
async fn test_model_info_and_health() {
    let app = app();
    let (status, info) = send(&app, Method::GET, "/api/v1/model-info", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["decision_threshold"], 0.5);
    assert_eq!(info["detector"], "stub");
    assert_eq!(info["features"].as_array().unwrap().len(), 11);

    let (status, health) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_stats_count_outcomes() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({ "typing_speed": 450, "time_on_page": 2, "payment_type": "paypal" })),
        None,
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({ "typing_speed": 450, "payment_type": "paypal" })),
        None,
    )
    .await;

    let (status, stats) = send(&app, Method::GET, "/api/v1/stats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["verifications"], 1);
    assert_eq!(stats["blocks"], 1);
    assert_eq!(stats["validation_rejections"], 1);
}
