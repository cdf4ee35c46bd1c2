use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use medidispatch_api::auth::jwt::{generate_access_token, JwtConfig};
use medidispatch_api::config::ServerConfig;
use medidispatch_api::router::build_app_router;
use medidispatch_api::state::AppState;
use medidispatch_api::ws::WsManager;
use medidispatch_core::types::DbId;
use medidispatch_events::EventBus;

use std::sync::Arc;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a fixed JWT secret, and the expiry sweeper disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        ws_heartbeat_secs: 30,
        request_expiry_minutes: 0,
        ops_alert_webhook_url: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool).0
}

/// Build the app and keep a handle on its event bus so tests can observe
/// the signals handlers publish.
pub fn build_test_app_with_bus(pool: PgPool) -> (Router, Arc<EventBus>) {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::clone(&event_bus),
        alerter: Arc::new(medidispatch_events::OpsAlerter::new(None)),
    };

    (build_app_router(state, &config), event_bus)
}

/// Mint a Bearer token for a test user.
pub fn bearer_token(user_id: DbId, role: &str) -> String {
    let token = generate_access_token(user_id, role, &test_config().jwt)
        .expect("token generation should succeed");
    format!("Bearer {token}")
}

/// Send an unauthenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated GET request.
pub async fn get_as(app: Router, uri: &str, user_id: DbId, role: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer_token(user_id, role))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated request with a JSON body.
pub async fn send_json_as(
    app: Router,
    method: &str,
    uri: &str,
    user_id: DbId,
    role: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer_token(user_id, role))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated POST with an empty body.
pub async fn post_as(app: Router, uri: &str, user_id: DbId, role: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, bearer_token(user_id, role))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

/// Assert the standard error envelope shape and return the `code`.
pub async fn error_code(response: Response<Body>, expected_status: StatusCode) -> String {
    assert_eq!(response.status(), expected_status);
    let json = body_json(response).await;
    assert!(json["error"].is_string(), "error message must be a string");
    json["code"]
        .as_str()
        .expect("error code must be a string")
        .to_string()
}
