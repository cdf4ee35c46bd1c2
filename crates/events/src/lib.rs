//! Dispatch event bus and operational alerting.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; the topic key of every event is the
//!   affected request's id.
//! - [`DispatchEvent`] — the canonical change-signal envelope.
//! - [`OpsAlerter`] — fire-and-forget webhook delivery of key milestones.

pub mod alert;
pub mod bus;

pub use alert::OpsAlerter;
pub use bus::{DispatchEvent, EventBus};
pub use bus::{
    EVENT_OFFER_ACCEPTED, EVENT_OFFER_SUBMITTED, EVENT_OFFER_WITHDRAWN, EVENT_REQUEST_ANNOTATED,
    EVENT_REQUEST_CANCELLED, EVENT_REQUEST_COMPLETED, EVENT_REQUEST_CREATED, EVENT_REQUEST_RATED,
    EVENT_TRACKING_ADVANCED,
};
