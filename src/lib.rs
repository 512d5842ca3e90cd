//! Outbound webhook dispatch engine for headless content delivery.
//!
//! Matches content-change events against registered webhook subscriptions,
//! builds HMAC-signed JSON payloads, queues deliveries, retries failures
//! with exponential backoff, and keeps a bounded delivery history for
//! operators.
//!
//! The content layer announces mutations through the [`Publisher`]
//! capability; the configuration layer manages endpoints through the
//! [`SubscriptionStore`]; everything in between is owned by the
//! [`WebhookEngine`].

pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod log;
pub mod queue;
pub mod signature;
pub mod subscription;
pub mod worker;

// Re-export main public API
pub use config::EngineConfig;
pub use dispatcher::{Publisher, WebhookDispatcher};
pub use engine::WebhookEngine;
pub use error::{Result, WebhookError};
pub use event::{AuthorRef, EntityDescriptor, EventKind, Payload};
pub use log::{DeliveryLog, DeliveryLogEntry, DeliveryOutcome};
pub use queue::{DeliveryJob, DeliveryQueue};
pub use subscription::{MemorySubscriptionStore, Subscription, SubscriptionStore};
