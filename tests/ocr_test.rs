mod helpers;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use medcare::config::OcrConfig;
use medcare::ocr::{ExtractionError, OcrClient};
use serde_json::{json, Value};

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(endpoint: String) -> OcrConfig {
    OcrConfig {
        endpoint,
        api_key: "secret".into(),
        timeout_secs: 5,
    }
}

async fn extract_ok(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    if auth != Some("Bearer secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "missing key" })));
    }
    let image = body["image"].as_str().unwrap_or_default();
    let bytes = base64::engine::general_purpose::STANDARD.decode(image).unwrap_or_default();
    if bytes != b"fake-jpeg" {
        return (StatusCode::OK, Json(json!({ "error": "Image data missing" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "hospital_name": "Apollo Specialty Clinic",
            "medicines": [
                { "med_name": "Augmentin 625 Duo", "dose": "625mg", "frequency": "1-0-1", "duration": "5 days", "instructions": "After food" },
                { "med_name": "Dolo 650", "dose": "650mg", "frequency": "1-0-1", "duration": "3 days", "instructions": "For fever" }
            ],
            "confidence_score": 0.98,
            "risk_flags": []
        })),
    )
}

async fn extract_fails() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "No response from model" })),
    )
}

#[tokio::test]
async fn extracts_prescription_from_image() {
    let base = spawn_stub(Router::new().route("/extract", post(extract_ok))).await;
    let client = OcrClient::new(&config(format!("{base}/extract"))).unwrap();

    let parsed = client.extract(b"fake-jpeg").await.unwrap();

    assert_eq!(parsed.hospital_name, "Apollo Specialty Clinic");
    assert_eq!(parsed.medicines.len(), 2);
    assert_eq!(parsed.medicines[1].name, "Dolo 650");
    assert!((parsed.confidence_score - 0.98).abs() < f64::EPSILON);
}

#[tokio::test]
async fn error_body_is_reported_as_extraction_failure() {
    let base = spawn_stub(Router::new().route("/extract", post(extract_ok))).await;
    let client = OcrClient::new(&config(format!("{base}/extract"))).unwrap();

    let err = client.extract(b"something else").await.unwrap_err();
    assert!(matches!(err, ExtractionError::Service(ref m) if m == "Image data missing"));
}

#[tokio::test]
async fn server_error_carries_status_and_message() {
    let base = spawn_stub(Router::new().route("/extract", post(extract_fails))).await;
    let client = OcrClient::new(&config(format!("{base}/extract"))).unwrap();

    match client.extract(b"fake-jpeg").await {
        Err(ExtractionError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "No response from model");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_image_is_rejected_before_sending() {
    let client = OcrClient::new(&config("http://127.0.0.1:9/extract".into())).unwrap();
    assert!(matches!(client.extract(&[]).await, Err(ExtractionError::EmptyImage)));
}

#[tokio::test]
async fn scanned_prescription_saves_with_alarms() {
    let base = spawn_stub(Router::new().route("/extract", post(extract_ok))).await;
    let mut cfg = medcare::config::MedcareConfig::default();
    cfg.ocr = config(format!("{base}/extract"));
    let (app, scheduler, _) = helpers::engine_with_config(Some("u1"), cfg);

    let parsed = app.scan_prescription(b"fake-jpeg").await.unwrap();
    let outcome = app
        .save_parsed("u1", parsed, &helpers::at(2024, 1, 1, 7, 0))
        .await
        .unwrap();

    assert_eq!(outcome.record.hospital_name, "Apollo Specialty Clinic");
    assert_eq!(scheduler.scheduled_count(), 14);
    let first = &scheduler.scheduled.lock().unwrap()[0];
    assert_eq!(first.body, "Take: Augmentin 625 Duo (625mg), Dolo 650 (650mg)");
}
