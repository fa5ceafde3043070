mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;

#[tokio::test]
async fn health_reports_database_and_cache() {
    let app = TestApp::new().await;
    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");
    assert_eq!(body["cache"]["status"], "up");
}

#[tokio::test]
async fn api_status_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.json(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "storefront-api");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.json(Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_count_requests_by_matched_route() {
    let app = TestApp::new().await;
    app.json(Method::GET, "/api/v1/status", None, None).await;
    app.json(Method::GET, "/api/v1/status", None, None).await;

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(
        "storefront_http_requests_total{method=\"GET\",route=\"/api/v1/status\",status=\"200\"} 2"
    ));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Storefront API");
    assert!(body["paths"]["/api/v1/quotations"]["post"].is_object());
}
