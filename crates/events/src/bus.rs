//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DispatchEvent`]s. Every
//! successful mutation on a request aggregate publishes one event keyed by
//! the request id; subscribers treat the payload purely as a "re-fetch
//! current state" hint. Delivery is at-least-once and unordered across
//! distinct requests.

use chrono::{DateTime, Utc};
use medidispatch_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

pub const EVENT_REQUEST_CREATED: &str = "request.created";
pub const EVENT_REQUEST_CANCELLED: &str = "request.cancelled";
pub const EVENT_REQUEST_COMPLETED: &str = "request.completed";
pub const EVENT_REQUEST_RATED: &str = "request.rated";
pub const EVENT_REQUEST_ANNOTATED: &str = "request.annotated";
pub const EVENT_OFFER_SUBMITTED: &str = "offer.submitted";
pub const EVENT_OFFER_WITHDRAWN: &str = "offer.withdrawn";
pub const EVENT_OFFER_ACCEPTED: &str = "offer.accepted";
pub const EVENT_TRACKING_ADVANCED: &str = "tracking.advanced";

// ---------------------------------------------------------------------------
// DispatchEvent
// ---------------------------------------------------------------------------

/// A change signal for one request aggregate.
///
/// The request id is the topic key: routing fans each event out to the
/// viewers subscribed to that request. The payload is advisory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Dot-separated event name, e.g. `"offer.accepted"`.
    pub event_type: String,

    /// Topic key: the affected request.
    pub request_id: DbId,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DispatchEvent {
    /// Create a new event for a request with only the required fields.
    pub fn new(event_type: impl Into<String>, request_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            request_id,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`DispatchEvent`]. Publishing
/// never blocks and never fails the caller's transaction.
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped —
    /// a signal is only a hint to re-fetch, never the state itself.
    pub fn publish(&self, event: DispatchEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
