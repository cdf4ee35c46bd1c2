//! HTTP/WebSocket surface of the dispatch backend.
//!
//! Exposes the axum router, handlers, auth extractor, configuration, and
//! the real-time notification plumbing. The binary in `main.rs` wires these
//! together; integration tests build the same router via
//! [`router::build_app_router`].

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
