// Delivery log
//
// Bounded history of delivery attempts, owned by the engine and written by
// the workers and the test entry point. Reads are most-recent-first and
// never consume entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Default capacity of the delivery log ring
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Default number of entries the operator log viewer reads
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Terminal classification of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Success,
    Failed,
}

/// One delivery attempt as shown to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub subscription_id: String,
    pub url: String,
    pub payload_summary: String,
    pub status_code: Option<u16>,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity ring of delivery attempts
#[derive(Debug)]
pub struct DeliveryLog {
    entries: RwLock<VecDeque<DeliveryLogEntry>>,
    capacity: usize,
}

impl DeliveryLog {
    pub fn new(capacity: usize) -> Self {
        Self { entries: RwLock::new(VecDeque::with_capacity(capacity)), capacity }
    }

    /// Append an entry, evicting the oldest past capacity
    pub async fn append(&self, entry: DeliveryLogEntry) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Most-recent-first view of up to `limit` entries
    pub async fn recent(&self, limit: usize) -> Vec<DeliveryLogEntry> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Most-recent-first view at the operator viewer's default limit
    pub async fn recent_default(&self) -> Vec<DeliveryLogEntry> {
        self.recent(DEFAULT_RECENT_LIMIT).await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for DeliveryLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
