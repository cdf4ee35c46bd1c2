//! Event-to-WebSocket routing.
//!
//! [`NotificationRouter`] subscribes to the dispatch event bus and forwards
//! each event to the WebSocket connections watching the affected request.
//! Payloads are re-fetch hints: the client is expected to GET the current
//! state, never to apply the event as a delta.

use std::sync::Arc;

use axum::extract::ws::Message;
use medidispatch_events::DispatchEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Routes dispatch events to subscribed WebSocket viewers.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    /// Create a new router over the given WebSocket manager.
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](medidispatch_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<DispatchEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.route_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Delivery is at-least-once; skipped hints only mean a
                    // client re-fetches slightly later.
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Forward a single event to every connection watching its request.
    async fn route_event(&self, event: &DispatchEvent) {
        let msg = serde_json::json!({
            "type": "dispatch_event",
            "event_type": event.event_type,
            "request_id": event.request_id,
            "payload": event.payload,
            "timestamp": event.timestamp,
        });
        let ws_msg = Message::Text(msg.to_string().into());

        let delivered = self
            .ws_manager
            .send_to_watchers(event.request_id, ws_msg)
            .await;

        tracing::debug!(
            event_type = %event.event_type,
            request_id = event.request_id,
            delivered,
            "Routed dispatch event"
        );
    }
}
