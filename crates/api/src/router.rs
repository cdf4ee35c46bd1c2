//! Application router assembly.
//!
//! [`build_app_router`] is the single place the route tree meets the
//! middleware stack; the production binary and the integration tests both
//! call it, so a dispatch flow exercised in a test runs through the same
//! layers it would in production.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Header used to correlate a dispatch action across log lines.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the full application [`Router`]: health probe at the root, the
/// dispatch API under `/api/v1`, and the middleware stack around both.
///
/// Ordering matters (axum applies layers bottom-up, so the last `.layer`
/// call sees the request first): the request id must be stamped before
/// tracing opens its span, and the timeout must sit inside panic recovery
/// so a handler that both stalls and panics still produces a response.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        // Every dispatch operation is a handful of row-level statements;
        // anything that runs into this budget is stuck, not slow.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the patient and nurse browser clients.
///
/// The allowed verbs are exactly what the route tree mounts: reads,
/// lifecycle POSTs, and the admin-notes PUT. An invalid configured origin
/// panics at startup rather than silently serving a half-open policy.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
