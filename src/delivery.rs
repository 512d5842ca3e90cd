// Webhook delivery sender
//
// Performs one signed HTTP POST per call and classifies the outcome.
// Shared by the queue workers and, synchronously, by the manual test entry
// point. Retry scheduling lives in the worker, not here.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::Payload;
use crate::log::{DeliveryLogEntry, DeliveryOutcome};
use crate::signature::{self, SIGNATURE_HEADER};
use crate::subscription::Subscription;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a single delivery attempt
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

impl DeliveryResult {
    /// Delivery log entry describing this attempt
    pub fn to_log_entry(&self, subscription: &Subscription, payload: &Payload) -> DeliveryLogEntry {
        DeliveryLogEntry {
            subscription_id: subscription.id.clone(),
            url: subscription.url.clone(),
            payload_summary: payload.summary(),
            status_code: self.status_code,
            outcome: if self.success { DeliveryOutcome::Success } else { DeliveryOutcome::Failed },
            error: self.error.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// HTTP executor for webhook deliveries
pub struct DeliverySender {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl DeliverySender {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Attempt one delivery: canonical-JSON body, signature header when the
    /// subscription has a secret, bounded by the request timeout.
    ///
    /// HTTP status in [200, 300) is success; any other status, timeout, or
    /// connection error is failure. Only payload encoding itself is an Err.
    pub async fn send(&self, subscription: &Subscription, payload: &Payload) -> Result<DeliveryResult> {
        let body = serde_json::to_string(payload)?;
        let start = Instant::now();

        let mut request = self
            .client
            .post(&subscription.url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent);

        if !subscription.secret.is_empty() {
            let sig = signature::sign(body.as_bytes(), &subscription.secret);
            request = request.header(SIGNATURE_HEADER, sig);
        }

        match request.body(body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let elapsed = start.elapsed().as_millis() as u64;

                debug!(
                    "Delivery to {} - status {}, time {} ms",
                    subscription.url, status, elapsed
                );

                let success = (200..300).contains(&status);
                Ok(DeliveryResult {
                    success,
                    status_code: Some(status),
                    response_time_ms: elapsed,
                    error: if success { None } else { Some(format!("HTTP {}", status)) },
                })
            }
            Err(e) => {
                let elapsed = start.elapsed().as_millis() as u64;

                warn!(
                    "Delivery to {} failed: {} (time {} ms)",
                    subscription.url, e, elapsed
                );

                Ok(DeliveryResult {
                    success: false,
                    status_code: e.status().map(|s| s.as_u16()),
                    response_time_ms: elapsed,
                    error: Some(e.to_string()),
                })
            }
        }
    }
}
