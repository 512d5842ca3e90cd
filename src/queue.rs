// Delivery queue
//
// At-least-once work queue feeding the delivery workers. A job dequeued by
// a crashing worker is lost; receivers are expected to deduplicate by
// entity_uuid + event + timestamp. Backoff is honored with real timers: a
// delayed enqueue becomes visible only once its delay elapses.

use crate::error::{Result, WebhookError};
use crate::event::Payload;
use crate::subscription::Subscription;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// One queued attempt to notify one subscription of one event
///
/// The subscription is captured by value at enqueue time, so later edits
/// never change in-flight jobs.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub subscription: Subscription,
    pub payload: Payload,
    /// 0-indexed count of attempts already completed
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
}

impl DeliveryJob {
    pub fn new(subscription: Subscription, payload: Payload) -> Self {
        Self { subscription, payload, attempt: 0, created_at: Utc::now() }
    }

    /// The same job, rescheduled for its next attempt
    pub fn next_attempt(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// Work queue between the event matcher and the delivery workers
///
/// Clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    tx: mpsc::UnboundedSender<DeliveryJob>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<DeliveryJob>>>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Arc::new(Mutex::new(rx)) }
    }

    /// Make a job visible to workers immediately
    pub fn enqueue(&self, job: DeliveryJob) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|_| WebhookError::QueueUnavailable("queue is closed".to_string()))
    }

    /// Make a job visible to workers after `delay` has elapsed
    ///
    /// The timer survives independently of the caller. If the queue closes
    /// while the timer is pending, the job is dropped.
    pub fn enqueue_after(&self, job: DeliveryJob, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return self.enqueue(job);
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(job).is_err() {
                debug!("Queue closed before delayed job became visible; job dropped");
            }
        });
        Ok(())
    }

    /// Wait for the next job. Returns None once the queue is closed and
    /// drained.
    pub async fn dequeue(&self) -> Option<DeliveryJob> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Non-blocking dequeue for polled consumers
    pub async fn try_dequeue(&self) -> Option<DeliveryJob> {
        let mut rx = self.rx.lock().await;
        rx.try_recv().ok()
    }

    /// Stop accepting new jobs. Jobs already visible remain dequeueable
    /// until drained.
    pub async fn close(&self) {
        let mut rx = self.rx.lock().await;
        rx.close();
    }
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}
