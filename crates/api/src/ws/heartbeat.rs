use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Spawn a background task that keeps watcher connections alive with
/// periodic Ping frames.
///
/// Dispatch viewers tend to sit idle between signals (a patient waiting
/// for offers receives nothing for minutes at a time), so without pings
/// intermediary proxies drop the connection before the next event
/// arrives. The interval comes from `WS_HEARTBEAT_SECS`.
///
/// The task runs until aborted via the returned `JoinHandle`, which
/// `main` does after the WebSocket manager has closed its connections.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            let count = ws_manager.connection_count().await;
            if count == 0 {
                continue;
            }
            tracing::debug!(count, "Pinging connected dispatch viewers");
            ws_manager.ping_all().await;
        }
    })
}
