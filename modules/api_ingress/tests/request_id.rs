//! `x-request-id` handling through the finalized host router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::util::ServiceExt;
use tracing_test::traced_test;

use api_ingress::{ApiIngress, ApiIngressConfig};

fn host_router() -> Router {
    let host = ApiIngress::new(ApiIngressConfig::default(), None);
    let routes = host.rest_prepare().route(
        "/traced",
        get(|| async {
            tracing::info!("handler reached");
            StatusCode::NO_CONTENT
        }),
    );
    host.rest_finalize(routes, &utoipa::openapi::OpenApi::default())
        .unwrap()
}

fn response_id(resp: &axum::response::Response) -> Option<String> {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[tokio::test]
async fn health_response_carries_generated_request_id() {
    let resp = host_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let id = response_id(&resp).expect("x-request-id should be generated");
    assert!(!id.is_empty());
}

#[tokio::test]
async fn generated_ids_differ_between_requests() {
    let app = host_router();
    let first = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_ne!(response_id(&first), response_id(&second));
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let resp = host_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response_id(&resp).as_deref(), Some("abc-123"));
}

#[traced_test]
#[tokio::test]
async fn handler_logs_are_tagged_with_request_id() {
    let resp = host_router()
        .oneshot(
            Request::builder()
                .uri("/traced")
                .header("x-request-id", "trace-me-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(logs_contain("handler reached"));
    assert!(logs_contain("request_id=trace-me-42"));
}
