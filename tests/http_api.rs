//! End-to-end HTTP behaviour through the axum router with stub collaborators

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{service_with, solid_png, RecordingStore, StubSource, API_KEY};
use garment_merge::server::{router, API_KEY_HEADER};
use garment_merge::{EncodedImage, StrategyKind};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const UPPER: &str = "https://cdn.test/upper.png";
const LOWER: &str = "https://cdn.test/lower.png";
const PHOTO: &str = "https://cdn.test/photo.png";

struct Harness {
    app: Router,
    source: Arc<StubSource>,
    store: Arc<RecordingStore>,
}

impl Harness {
    fn new(strategy: StrategyKind, store: RecordingStore) -> Self {
        let source = Arc::new(
            StubSource::new()
                .with_image(UPPER, solid_png(800, 600, [200, 30, 30]))
                .with_image(LOWER, solid_png(800, 400, [30, 30, 200]))
                .with_image(PHOTO, solid_png(64, 48, [250, 250, 250])),
        );
        let store = Arc::new(store);
        let app = router(service_with(strategy, source.clone(), store.clone()));
        Self { app, source, store }
    }

    fn healthy() -> Self {
        Self::new(StrategyKind::FixedAspect, RecordingStore::new())
    }
}

fn post_json(path: &str, key: Option<&str>, body: &Value) -> Request<Body> {
    post_raw(path, key, body.to_string())
}

fn post_raw(path: &str, key: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let harness = Harness::healthy();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&harness.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_merge_requires_api_key() {
    let harness = Harness::healthy();
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });

    let (status, body) = send(&harness.app, post_json("/merge-clothes", None, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "code": 401, "message": "Missing merge API key" }));

    let (status, body) = send(&harness.app, post_json("/merge-clothes", Some("wrong"), &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid merge API key");

    assert_eq!(harness.source.calls(), 0);
    assert!(harness.store.uploads().is_empty());
}

#[tokio::test]
async fn test_bearer_authorization_is_accepted() {
    let harness = Harness::healthy();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/merge-clothes")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
        .body(Body::from(json!({ "upperUrl": UPPER, "lowerUrl": LOWER }).to_string()))
        .unwrap();

    let (status, _) = send(&harness.app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_remove_background_requires_api_key() {
    let harness = Harness::healthy();
    let payload = json!({ "imageUrl": PHOTO });
    let (status, _) = send(&harness.app, post_json("/remove-background", None, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.source.calls(), 0);
}

#[tokio::test]
async fn test_merge_rejects_missing_fields_before_fetching() {
    let harness = Harness::healthy();
    for payload in [
        json!({}),
        json!({ "upperUrl": UPPER }),
        json!({ "lowerUrl": LOWER }),
        json!({ "upperUrl": "", "lowerUrl": LOWER }),
    ] {
        let (status, body) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"], "upperUrl and lowerUrl required");
    }
    assert_eq!(harness.source.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let harness = Harness::healthy();
    let request = post_raw("/merge-clothes", Some(API_KEY), "{ not json".to_string());
    let (status, body) = send(&harness.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(harness.source.calls(), 0);
}

#[tokio::test]
async fn test_merge_uploads_png_and_returns_signed_url() {
    let harness = Harness::healthy();
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    let (status, body) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.source.calls(), 2);

    let uploads = harness.store.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.bucket, "merged-images");
    assert_eq!(upload.content_type, "image/png");
    assert!(!upload.upsert);
    assert!(upload.key.starts_with("merged/"));
    assert!(upload.key.ends_with(".png"));

    let merged = EncodedImage::new(upload.bytes.clone());
    assert_eq!(merged.dimensions().unwrap(), (1024, 768));

    let signed = harness.store.signed();
    assert_eq!(signed, vec![(upload.key.clone(), Duration::from_secs(900))]);
    assert_eq!(
        body["mergedUrl"],
        format!("https://storage.test/merged-images/{}?token=signed", upload.key)
    );
}

#[tokio::test]
async fn test_merge_with_stack_strategy() {
    let harness = Harness::new(StrategyKind::Stack, RecordingStore::new());
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    let (status, _) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;
    assert_eq!(status, StatusCode::OK);

    let upload = &harness.store.uploads()[0];
    let merged = EncodedImage::new(upload.bytes.clone());
    assert_eq!(merged.dimensions().unwrap(), (1024, 1280));
}

#[tokio::test]
async fn test_each_merge_gets_a_distinct_key() {
    let harness = Harness::healthy();
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    for _ in 0..2 {
        let (status, _) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let uploads = harness.store.uploads();
    assert_eq!(uploads.len(), 2);
    assert_ne!(uploads[0].key, uploads[1].key);
}

#[tokio::test]
async fn test_download_failure_is_internal_error() {
    let harness = Harness::healthy();
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": "https://cdn.test/missing.png" });
    let (status, body) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to download image"), "{message}");
    assert!(harness.store.uploads().is_empty());
}

#[tokio::test]
async fn test_undecodable_download_is_internal_error() {
    let source = Arc::new(
        StubSource::new()
            .with_image(UPPER, b"<html>404</html>".to_vec())
            .with_image(LOWER, solid_png(10, 10, [0, 0, 0])),
    );
    let store = Arc::new(RecordingStore::new());
    let app = router(service_with(StrategyKind::FixedAspect, source, store.clone()));

    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    let (status, body) = send(&app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to compose images"));
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_storage_error() {
    let harness = Harness::new(StrategyKind::FixedAspect, RecordingStore::failing_upload());
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    let (status, body) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Storage error"));
    assert!(harness.store.signed().is_empty());
}

#[tokio::test]
async fn test_sign_failure_leaves_uploaded_object() {
    let harness = Harness::new(StrategyKind::FixedAspect, RecordingStore::failing_sign());
    let payload = json!({ "upperUrl": UPPER, "lowerUrl": LOWER });
    let (status, body) = send(&harness.app, post_json("/merge-clothes", Some(API_KEY), &payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Storage error"));
    assert_eq!(harness.store.uploads().len(), 1);
}

#[tokio::test]
async fn test_remove_background_uploads_under_nobg_key() {
    let harness = Harness::healthy();
    let payload = json!({ "imageUrl": PHOTO });
    let (status, body) = send(&harness.app, post_json("/remove-background", Some(API_KEY), &payload)).await;

    assert_eq!(status, StatusCode::OK);
    let uploads = harness.store.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].key.starts_with("merged/nobg-"));
    assert_eq!(uploads[0].content_type, "image/png");
    assert!(body["processedUrl"].as_str().unwrap().contains(&uploads[0].key));

    // The near-white photo is entirely above the default cutoff
    let processed = EncodedImage::new(uploads[0].bytes.clone()).decode().unwrap().to_rgba8();
    assert_eq!(processed.dimensions(), (64, 48));
    assert!(processed.pixels().all(|p| p.0[3] == 0));
}

#[tokio::test]
async fn test_remove_background_threshold_bounds() {
    let harness = Harness::healthy();
    for threshold in [0, 255] {
        let payload = json!({ "imageUrl": PHOTO, "threshold": threshold });
        let (status, _) = send(&harness.app, post_json("/remove-background", Some(API_KEY), &payload)).await;
        assert_eq!(status, StatusCode::OK, "threshold {threshold}");
    }

    let fetches = harness.source.calls();
    for threshold in [-1, 256] {
        let payload = json!({ "imageUrl": PHOTO, "threshold": threshold });
        let (status, body) = send(&harness.app, post_json("/remove-background", Some(API_KEY), &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "threshold {threshold}");
        assert!(body["error"].is_string());
    }
    assert_eq!(harness.source.calls(), fetches);
}

#[tokio::test]
async fn test_remove_background_requires_image_url() {
    let harness = Harness::healthy();
    let (status, body) = send(
        &harness.app,
        post_json("/remove-background", Some(API_KEY), &json!({ "threshold": 200 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "imageUrl required");
}

#[tokio::test]
async fn test_cors_preflight_allows_api_key_header() {
    let harness = Harness::healthy();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/merge-clothes")
        .header(header::ORIGIN, "https://shop.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, API_KEY_HEADER)
        .body(Body::empty())
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.contains(API_KEY_HEADER));
    assert_eq!(harness.source.calls(), 0);
}
