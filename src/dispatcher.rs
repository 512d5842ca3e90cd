// Event matcher / trigger
//
// Bridges the content layer into the delivery engine. Publishing never
// fails and never touches the network: it filters subscriptions, builds
// the payload once, and enqueues one job per match. Runs inline in the
// content layer's save/delete path, so silence is a hard requirement.

use crate::event::{EntityDescriptor, EventKind, Payload};
use crate::queue::{DeliveryJob, DeliveryQueue};
use crate::subscription::SubscriptionStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability the content layer uses to announce entity mutations
///
/// The content layer depends on this trait only, never on the delivery
/// engine's internals.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Announce a content change. Never fails; delivery trouble surfaces
    /// in the delivery log instead.
    async fn publish(&self, entity: &EntityDescriptor, event: EventKind);
}

/// Matches content-change events against subscriptions and queues one
/// delivery job per match
pub struct WebhookDispatcher {
    store: Arc<dyn SubscriptionStore>,
    queue: DeliveryQueue,
}

impl WebhookDispatcher {
    pub fn new(store: Arc<dyn SubscriptionStore>, queue: DeliveryQueue) -> Self {
        Self { store, queue }
    }
}

#[async_trait]
impl Publisher for WebhookDispatcher {
    async fn publish(&self, entity: &EntityDescriptor, event: EventKind) {
        let subscriptions = self.store.list().await;
        if subscriptions.is_empty() {
            return;
        }

        // Built once per triggering event, shared by every match
        let payload = Payload::for_entity(entity, event);

        let mut queued = 0;
        for subscription in subscriptions {
            if !subscription.matches(entity, event) {
                continue;
            }
            let job = DeliveryJob::new(subscription, payload.clone());
            match self.queue.enqueue(job) {
                Ok(()) => queued += 1,
                // Queue trouble must not fail the content save path
                Err(e) => warn!("Webhook enqueue failed: {}", e),
            }
        }

        if queued > 0 {
            debug!("Queued {} webhook deliveries for {} {}", queued, event, entity.uuid);
        }
    }
}
