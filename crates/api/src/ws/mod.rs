//! WebSocket support: connection management, the upgrade handler with
//! per-connection request subscriptions, and the heartbeat task.

pub mod handler;
pub mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
