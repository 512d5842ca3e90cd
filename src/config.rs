// Engine configuration
//
// Tunables for the delivery workers and retry schedule. Defaults follow the
// production values: 3 total attempts per job, exponential backoff starting
// at 60s, 10s request timeout, 100-entry delivery log.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_user_agent() -> String {
    format!("headless-webhooks/{}", env!("CARGO_PKG_VERSION"))
}

/// Webhook engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of concurrent delivery workers
    pub worker_count: usize,

    /// Total delivery attempts per job (initial attempt included)
    pub max_attempts: u32,

    /// Base retry delay in milliseconds; attempt n waits base * 2^n
    pub base_delay_ms: u64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Delivery log capacity; oldest entries are evicted past this
    pub log_capacity: usize,

    /// User-Agent header sent with every delivery
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            max_attempts: 3,
            base_delay_ms: 60_000,
            request_timeout_secs: 10,
            log_capacity: 100,
            user_agent: default_user_agent(),
        }
    }
}

impl EngineConfig {
    /// Backoff delay before re-attempting a job whose 0-indexed attempt
    /// `attempt` just failed: base * 2^attempt (60s, 120s, 240s, ...)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Per-request timeout for a single delivery attempt
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
