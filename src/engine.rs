// Webhook engine
//
// Wires the subscription store, queue, log, sender and workers together
// and owns their lifecycle. Hosts construct one engine, start it, hand the
// publisher to the content layer, and shut it down on exit. An engine is
// single-lifecycle: once shut down, its queue stays closed.

use crate::config::EngineConfig;
use crate::delivery::DeliverySender;
use crate::dispatcher::WebhookDispatcher;
use crate::error::{Result, WebhookError};
use crate::event::Payload;
use crate::log::DeliveryLog;
use crate::queue::DeliveryQueue;
use crate::subscription::{MemorySubscriptionStore, SubscriptionStore};
use crate::worker::WorkerPool;
use std::sync::Arc;
use tracing::info;

/// The webhook dispatch engine
pub struct WebhookEngine {
    config: EngineConfig,
    store: Arc<dyn SubscriptionStore>,
    queue: DeliveryQueue,
    log: Arc<DeliveryLog>,
    sender: Arc<DeliverySender>,
    workers: Option<WorkerPool>,
}

impl WebhookEngine {
    /// Engine backed by the in-memory subscription store
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(Arc::new(MemorySubscriptionStore::new()), config)
    }

    /// Engine backed by a host-provided subscription store
    pub fn with_store(store: Arc<dyn SubscriptionStore>, config: EngineConfig) -> Self {
        let log = Arc::new(DeliveryLog::new(config.log_capacity));
        let sender = Arc::new(DeliverySender::new(&config));
        Self { config, store, queue: DeliveryQueue::new(), log, sender, workers: None }
    }

    /// Spawn the delivery workers. Calling twice is a no-op.
    pub fn start(&mut self) {
        if self.workers.is_some() {
            return;
        }
        info!(
            "Starting webhook engine: {} workers, {} max attempts",
            self.config.worker_count, self.config.max_attempts
        );
        self.workers = Some(WorkerPool::spawn(
            self.config.clone(),
            self.queue.clone(),
            self.sender.clone(),
            self.log.clone(),
        ));
    }

    /// Close the queue, let workers drain visible jobs, and wait for them
    /// to exit. Pending backoff timers are discarded.
    pub async fn shutdown(&mut self) {
        self.queue.close().await;
        if let Some(workers) = self.workers.take() {
            workers.join().await;
        }
        info!("Webhook engine stopped");
    }

    /// Publisher capability for the content layer
    pub fn publisher(&self) -> Arc<WebhookDispatcher> {
        Arc::new(WebhookDispatcher::new(self.store.clone(), self.queue.clone()))
    }

    /// Subscription store shared with the configuration layer
    pub fn subscriptions(&self) -> Arc<dyn SubscriptionStore> {
        self.store.clone()
    }

    /// Delivery history read model
    pub fn delivery_log(&self) -> Arc<DeliveryLog> {
        self.log.clone()
    }

    /// Send a synthetic test payload to one subscription, synchronously:
    /// no queuing, no retry, exactly one delivery log entry. Returns
    /// whether the endpoint accepted it.
    pub async fn send_test(&self, subscription_id: &str) -> Result<bool> {
        let subscription = self
            .store
            .get(subscription_id)
            .await
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        let payload = Payload::test();
        let result = self.sender.send(&subscription, &payload).await?;
        self.log.append(result.to_log_entry(&subscription, &payload)).await;
        Ok(result.success)
    }
}
