//! Stale-request expiry sweeper.
//!
//! Cancels live requests that have aged past the configured TTL without
//! attracting a single pending offer. Runs on a fixed interval using
//! `tokio::time::interval` until the cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use medidispatch_db::repositories::RequestRepo;
use medidispatch_db::DbPool;
use medidispatch_events::{DispatchEvent, EventBus, EVENT_REQUEST_CANCELLED};
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the expiry sweep loop.
///
/// `ttl_minutes` comes from `REQUEST_EXPIRY_MINUTES`; the caller skips
/// spawning this task entirely when it is zero. Each expired request gets a
/// `request.cancelled` event so watching clients re-fetch and see the
/// terminal state.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    ttl_minutes: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        ttl_minutes,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Request expiry sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Request expiry sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match RequestRepo::expire_stale(&pool, ttl_minutes).await {
                    Ok(expired) => {
                        if !expired.is_empty() {
                            tracing::info!(count = expired.len(), "Expired stale requests");
                        }
                        for request_id in expired {
                            event_bus.publish(
                                DispatchEvent::new(EVENT_REQUEST_CANCELLED, request_id)
                                    .with_payload(serde_json::json!({"reason": "expired"})),
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Request expiry sweep failed");
                    }
                }
            }
        }
    }
}
