mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{EngineMode, Harness, PROCESSED_BUCKET, RAW_BUCKET};
use video_processing_service::app::create_app;
use video_processing_service::state::AppState;

fn app(harness: &Harness) -> Router {
    create_app(AppState::new(harness.orchestrator.clone()))
}

fn push_body(payload: &str) -> String {
    json!({
        "message": {
            "data": STANDARD.encode(payload),
            "messageId": "2070443601311540",
            "attributes": {}
        },
        "subscription": "projects/demo/subscriptions/raw-videos"
    })
    .to_string()
}

async fn post(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process-video")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_process_video_ok() {
    let harness = Harness::new(EngineMode::Succeed).await;
    harness.seed_raw("clip.mp4", "640x480");

    let (status, body) = post(app(&harness), push_body(r#"{"name":"clip.mp4"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Video processed successfully");
    assert_eq!(body["data"]["target_key"], "clip-360p.mp4");
    assert!(harness.store.is_public(PROCESSED_BUCKET, "clip-360p.mp4"));
    assert!(!harness.store.contains(RAW_BUCKET, "clip.mp4"));
}

#[tokio::test]
async fn test_process_video_rejects_bad_envelopes() {
    let harness = Harness::new(EngineMode::Succeed).await;

    let bodies = [
        "not json".to_string(),
        json!({ "subscription": "x" }).to_string(),
        json!({ "message": { "data": "%%%not-base64%%%" } }).to_string(),
        push_body("not json either"),
        push_body("{}"),
        push_body(r#"{"name":""}"#),
    ];

    for body in bodies {
        let (status, json) = post(app(&harness), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid data");
    }

    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn test_process_video_rejects_unsafe_name() {
    let harness = Harness::new(EngineMode::Succeed).await;

    let (status, body) = post(app(&harness), push_body(r#"{"name":"../etc/passwd.mp4"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid data"));
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn test_process_video_failure_is_500() {
    let harness = Harness::new(EngineMode::Fail).await;
    harness.seed_raw("clip.mp4", "640x480");

    let (status, body) = post(app(&harness), push_body(r#"{"name":"clip.mp4"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error processing video");
    assert!(body["data"].is_null());
    assert!(harness.staging_is_empty());
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new(EngineMode::Succeed).await;

    let response = app(&harness)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
