//! Real-time notification fan-out from the event bus to WebSocket viewers.

pub mod router;

pub use router::NotificationRouter;
