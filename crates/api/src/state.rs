use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: medidispatch_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (viewer clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus publishing every successful mutation, keyed by request id.
    pub event_bus: Arc<medidispatch_events::EventBus>,
    /// Fire-and-forget operational milestone alerter.
    pub alerter: Arc<medidispatch_events::OpsAlerter>,
}
