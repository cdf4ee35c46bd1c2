//! Fire-and-forget operational alerting.
//!
//! [`OpsAlerter`] posts key dispatch milestones (request created, offer
//! accepted) to an operator-configured webhook. Delivery runs on a spawned
//! task: a slow or failing alert endpoint can never block or roll back the
//! core transaction that triggered it. There is deliberately no retry.

use std::sync::Arc;
use std::time::Duration;

use crate::bus::DispatchEvent;

/// HTTP request timeout for a single alert attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts milestone events to an external alert webhook.
pub struct OpsAlerter {
    client: reqwest::Client,
    /// `None` disables alerting entirely.
    webhook_url: Option<String>,
}

impl OpsAlerter {
    /// Create an alerter. Pass `None` to disable delivery (events are
    /// logged at debug level and dropped).
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            webhook_url,
        }
    }

    /// Send a milestone alert without waiting for the result.
    ///
    /// Failures are logged and swallowed; the caller has already committed.
    pub fn alert(self: &Arc<Self>, event: &DispatchEvent) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!(
                event_type = %event.event_type,
                request_id = event.request_id,
                "Ops alerting disabled, dropping milestone"
            );
            return;
        };

        let alerter = Arc::clone(self);
        let event = event.clone();
        tokio::spawn(async move {
            let payload = serde_json::json!({
                "event_type": event.event_type,
                "request_id": event.request_id,
                "payload": event.payload,
                "timestamp": event.timestamp,
            });

            match alerter.client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        event_type = %event.event_type,
                        request_id = event.request_id,
                        "Ops alert delivered"
                    );
                }
                Ok(response) => {
                    tracing::warn!(
                        event_type = %event.event_type,
                        request_id = event.request_id,
                        status = %response.status(),
                        "Ops alert endpoint returned an error status"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        event_type = %event.event_type,
                        request_id = event.request_id,
                        error = %e,
                        "Ops alert delivery failed"
                    );
                }
            }
        });
    }
}
