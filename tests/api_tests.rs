use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use guestbrief::insights::InsightDocument;
use guestbrief::profile::fallback_profile;
use guestbrief::test_utils::{diner_named, init_test_logging, reservation};
use guestbrief::AppState;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

fn app() -> (Arc<AppState>, Router) {
    let app_state = Arc::new(AppState::new_for_testing());
    let routes = guestbrief::app::routes(app_state.clone());
    (app_state, routes)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn detail(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap();
    value["detail"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_root_reports_running() {
    init_test_logging();
    let (_, router) = app();

    let (status, body) = get(router, "/").await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "running");
    assert_eq!(value["message"], "Restaurant Insights API");
}

#[tokio::test]
async fn test_health_endpoint() {
    init_test_logging();
    let (_, router) = app();

    let (status, body) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_not_found() {
    init_test_logging();
    let (_, router) = app();

    let (status, _) = get(router, "/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profiles_missing_is_404() {
    init_test_logging();
    let (_, router) = app();

    let (status, body) = get(router, "/api/profiles").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        detail(&body),
        "Insights data not found. Please generate insights first."
    );
}

#[tokio::test]
async fn test_profiles_malformed_is_500() {
    init_test_logging();
    let (state, router) = app();
    std::fs::write(state.insight_store.path(), b"{\"profiles\": [ oops").unwrap();

    let (status, body) = get(router, "/api/profiles").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(detail(&body), "Error reading insights data");
}

#[tokio::test]
async fn test_profiles_unreadable_is_500_with_cause() {
    init_test_logging();
    let (state, router) = app();
    std::fs::create_dir(state.insight_store.path()).unwrap();

    let (status, body) = get(router, "/api/profiles").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(&body).starts_with("Internal server error: "));
}

#[tokio::test]
async fn test_profiles_returned_verbatim() {
    init_test_logging();
    let (state, router) = app();
    // Unusual spacing and key order must survive untouched.
    let stored = b"{\"profiles\":[],   \"vip_count\": 0,\n \"total_reservations\":0}";
    std::fs::write(state.insight_store.path(), stored).unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/profiles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], &stored[..]);
}

#[tokio::test]
async fn test_profiles_serves_written_document() {
    init_test_logging();
    let (state, router) = app();
    let target = reservation("2024-06-01", 2, vec![]);
    let diner = diner_named("Ada Park", vec![target.clone()]);
    let document =
        InsightDocument::new(vec![fallback_profile(&diner, &target)], Utc::now());
    state.insight_store.write_document(&document).unwrap();

    let (status, body) = get(router, "/api/profiles").await;

    assert_eq!(status, StatusCode::OK);
    let served: InsightDocument = serde_json::from_slice(&body).unwrap();
    assert_eq!(served, document);
}

#[tokio::test]
async fn test_profiles_allow_any_origin() {
    init_test_logging();
    let (_, router) = app();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

// This test demonstrates how to test with a real server if needed
#[tokio::test]
async fn test_with_real_server() {
    init_test_logging();
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (app_state, router) = app();
    std::fs::write(app_state.insight_store.path(), b"{\"profiles\": []}").unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/api/profiles", addr))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.text().await.expect("Failed to read response body");
    assert_eq!(body, "{\"profiles\": []}");
}
