//! HTTP endpoint tests: health check and the incoming-call webhook.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use callbridge_gateway::config::ServerConfig;
use callbridge_gateway::routes;
use callbridge_gateway::state::AppState;

fn test_app() -> Router {
    let config = ServerConfig {
        openai_api_key: "sk-test".to_string(),
        ..Default::default()
    };
    let state: Arc<AppState> = AppState::new(config);

    Router::new()
        .merge(routes::api::create_api_router())
        .merge(routes::media::create_media_router())
        .with_state(state)
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Callbridge media stream server is running");
}

#[tokio::test]
async fn test_incoming_call_returns_twiml() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .header("host", "gateway.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/xml"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let twiml = String::from_utf8(body.to_vec()).unwrap();
    assert!(twiml.contains("<Connect>"));
    assert!(twiml.contains(r#"<Stream url="wss://gateway.example.com/media-stream" />"#));
}

#[tokio::test]
async fn test_incoming_call_accepts_get() {
    // Telephony platforms can be configured to GET the webhook
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/incoming-call")
                .header("host", "gateway.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_media_stream_requires_upgrade() {
    // A plain GET without the WebSocket upgrade headers must not be a 404;
    // the route exists and rejects the request as a bad upgrade.
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.status().is_client_error());
}
