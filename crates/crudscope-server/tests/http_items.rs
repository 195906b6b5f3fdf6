//! End-to-end request instrumentation through the axum router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crudscope_core::error::{CrudError, Result};
use crudscope_server::{
    app_state::AppState,
    config::AppConfig,
    obs::HttpMetrics,
    router::build_router,
    store::{Item, ItemStore},
};

fn app() -> (Router, Arc<HttpMetrics>) {
    let state = AppState::new(AppConfig::default());
    let metrics = state.metrics();
    (build_router(state), metrics)
}

fn app_with_store(store: Arc<dyn ItemStore>) -> (Router, Arc<HttpMetrics>) {
    let state = AppState::with_store(AppConfig::default(), store);
    let metrics = state.metrics();
    (build_router(state), metrics)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn three_list_requests_count_three() {
    let (app, metrics) = app();
    for _ in 0..3 {
        let (status, body) = send(&app, "GET", "/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
    }
    assert_eq!(metrics.requests.get(&["GET", "/items", "200"]), 3);
    assert_eq!(metrics.errors.series_count(), 0);
    assert_eq!(metrics.last_duration.snapshot(&["GET", "/items"]).unwrap().count, 3);
}

#[tokio::test]
async fn forced_failure_records_500() {
    let (app, metrics) = app();
    let (status, body) = send(&app, "GET", "/items?fail=1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "SIMULATED_FAILURE");

    assert_eq!(metrics.requests.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.errors.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.requests.get(&["GET", "/items", "200"]), 0);
}

#[tokio::test]
async fn missing_item_is_404_but_not_an_error() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/items/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(metrics.requests.get(&["GET", "/items/<id>", "404"]), 1);
    assert_eq!(metrics.errors.get(&["GET", "/items/<id>", "404"]), 0);
    assert_eq!(metrics.errors.series_count(), 0);
}

#[tokio::test]
async fn crud_lifecycle_codes() {
    let (app, metrics) = app();

    let (status, body) = send(&app, "POST", "/items", Some(json!({"name": "a"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created, json!({"id": 1, "data": {"name": "a"}}));

    let (status, body) = send(&app, "PUT", "/items/1", Some(json!({"name": "b"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["data"]["name"], "b");

    let (status, _) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "DELETE", "/items/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(&app, "DELETE", "/items/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(metrics.requests.get(&["POST", "/items", "201"]), 1);
    assert_eq!(metrics.requests.get(&["PUT", "/items/<id>", "200"]), 1);
    assert_eq!(metrics.requests.get(&["GET", "/items/<id>", "200"]), 1);
    assert_eq!(metrics.requests.get(&["DELETE", "/items/<id>", "204"]), 1);
    assert_eq!(metrics.requests.get(&["DELETE", "/items/<id>", "404"]), 1);
}

#[tokio::test]
async fn empty_body_creates_empty_data_and_bad_json_is_400() {
    let (app, metrics) = app();
    let (status, body) = send(&app, "POST", "/items", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["data"], json!({}));

    let req = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{broken"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(metrics.requests.get(&["POST", "/items", "400"]), 1);
    assert_eq!(metrics.errors.series_count(), 0);
}

#[tokio::test]
async fn non_numeric_id_is_recorded_as_404() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/items/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(metrics.requests.get(&["GET", "/items/<id>", "404"]), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_requests_cross_the_threshold() {
    let (app, metrics) = app();

    let (status, _) = send(&app, "GET", "/items?delay=6.0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics.slow.get(&["GET", "/items"]), 1);

    let (status, _) = send(&app, "GET", "/items?delay=4.0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics.slow.get(&["GET", "/items"]), 1);
}

#[tokio::test]
async fn malformed_delay_is_ignored() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/items?delay=soon", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics.requests.get(&["GET", "/items", "200"]), 1);
    assert_eq!(metrics.slow.series_count(), 0);
}

struct BrokenStore {
    panic: bool,
}

#[async_trait]
impl ItemStore for BrokenStore {
    async fn list(&self) -> Vec<Item> {
        if self.panic {
            panic!("store poisoned");
        }
        Vec::new()
    }
    async fn create(&self, data: Value) -> Item {
        Item { id: 1, data }
    }
    async fn get(&self, _id: u64) -> Result<Item> {
        Err(CrudError::Internal("connection reset".into()))
    }
    async fn update(&self, _id: u64, _data: Value) -> Result<Item> {
        Err(CrudError::status_error(409, "conflict"))
    }
    async fn delete(&self, _id: u64) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unexpected_store_error_is_500() {
    let (app, metrics) = app_with_store(Arc::new(BrokenStore { panic: false }));
    let (status, body) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["error"], "INTERNAL");
    assert_eq!(metrics.requests.get(&["GET", "/items/<id>", "500"]), 1);
    assert_eq!(metrics.errors.get(&["GET", "/items/<id>", "500"]), 1);
}

#[tokio::test]
async fn explicit_status_error_keeps_its_code() {
    let (app, metrics) = app_with_store(Arc::new(BrokenStore { panic: false }));
    let (status, _) = send(&app, "PUT", "/items/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(metrics.requests.get(&["PUT", "/items/<id>", "409"]), 1);
    assert_eq!(metrics.errors.series_count(), 0);
}

#[tokio::test]
async fn panicking_handler_is_recorded_exactly_once() {
    let (app, metrics) = app_with_store(Arc::new(BrokenStore { panic: true }));
    let (status, _) = send(&app, "GET", "/items", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(metrics.requests.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.errors.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.requests.series_count(), 1);
}

#[tokio::test]
async fn metrics_endpoint_renders_families() {
    let (app, _metrics) = app();
    send(&app, "GET", "/items", None).await;
    send(&app, "GET", "/items?fail=yes", None).await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let text = String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap();

    assert!(text.contains("# TYPE http_requests_total counter"));
    assert!(text.contains(r#"http_requests_total{method="GET",route="/items",code="200"} 1"#));
    assert!(text.contains(r#"http_errors_total{method="GET",route="/items",code="500"} 1"#));
    assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
    assert!(text.contains(r#"http_request_duration_seconds_bucket{method="GET",route="/items",code="200",le="+Inf"} 1"#));
    assert!(text.contains(r#"http_last_request_duration_seconds_count{method="GET",route="/items"} 2"#));
    assert!(text.contains("# TYPE http_slow_requests_total counter"));
}

#[tokio::test]
async fn ops_endpoints_are_not_instrumented() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics.requests.series_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn abandoned_request_is_still_recorded() {
    let (app, metrics) = app();
    let req = Request::builder()
        .uri("/items?delay=6.0")
        .body(Body::empty())
        .unwrap();
    let out = tokio::time::timeout(Duration::from_secs(1), app.clone().oneshot(req)).await;
    assert!(out.is_err(), "client gives up before the delay ends");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(metrics.requests.get(&["GET", "/items", "200"]), 1);
    assert_eq!(metrics.slow.get(&["GET", "/items"]), 1);
}

#[tokio::test]
async fn oversized_body_is_recorded_with_413() {
    let (app, metrics) = app();
    let big = vec![b' '; 3 * 1024 * 1024];
    let req = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(big))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(metrics.requests.get(&["POST", "/items", "413"]), 1);
    assert_eq!(metrics.errors.series_count(), 0);
}

#[tokio::test]
async fn undecodable_path_is_recorded_with_400() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/items/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(metrics.requests.get(&["GET", "/items/<id>", "400"]), 1);
}

#[tokio::test]
async fn repeated_fail_key_still_forces_failure() {
    let (app, metrics) = app();
    let (status, _) = send(&app, "GET", "/items?fail=1&fail=1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(metrics.requests.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.errors.get(&["GET", "/items", "500"]), 1);
    assert_eq!(metrics.requests.get(&["GET", "/items", "200"]), 0);
}
