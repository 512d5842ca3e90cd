// Webhook subscriptions and their store
//
// A subscription is a configured endpoint plus its event/entity filter.
// Malformed subscriptions are rejected at write time so they never reach
// the delivery queue. The engine itself never mutates subscriptions; all
// writes come from the configuration layer.

use crate::error::{Result, WebhookError};
use crate::event::{EntityDescriptor, EventKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// A configured webhook endpoint plus its event/entity filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique id, assigned by the store at creation and never reused
    pub id: String,
    /// Operator-facing label
    pub label: String,
    /// Absolute HTTP(S) URL events are POSTed to
    pub url: String,
    /// HMAC secret; empty means deliveries are unsigned
    pub secret: String,
    /// Event kinds this subscription wants
    pub events: Vec<EventKind>,
    /// Entity types this subscription wants
    pub entity_types: Vec<String>,
    /// Bundle filter; empty means all bundles
    pub bundles: Vec<String>,
    /// Disabled subscriptions never match
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a subscription with the default filter: all content-change
    /// events on `node` entities, any bundle.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            label: label.into(),
            url: url.into(),
            secret: String::new(),
            events: vec![EventKind::Create, EventKind::Update, EventKind::Delete],
            entity_types: vec!["node".to_string()],
            bundles: Vec::new(),
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Check whether this subscription wants a given entity event
    pub fn matches(&self, entity: &EntityDescriptor, event: EventKind) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.events.contains(&event) {
            return false;
        }
        if !self.entity_types.contains(&entity.entity_type) {
            return false;
        }
        if !self.bundles.is_empty() && !self.bundles.contains(&entity.bundle) {
            return false;
        }
        true
    }

    fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| WebhookError::Configuration(format!("invalid URL {:?}: {}", self.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(WebhookError::Configuration(format!(
                "URL must be http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.events.is_empty() {
            return Err(WebhookError::Configuration("no events selected".to_string()));
        }
        if self.entity_types.is_empty() {
            return Err(WebhookError::Configuration("no entity types selected".to_string()));
        }
        Ok(())
    }
}

/// Durable mapping from subscription id to configuration
///
/// The in-memory implementation below suits embedded use; hosts with their
/// own persistence implement this trait over it.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list(&self) -> Vec<Subscription>;

    async fn get(&self, id: &str) -> Option<Subscription>;

    /// Validate and insert, assigning a fresh id. Returns the id.
    async fn add(&self, subscription: Subscription) -> Result<String>;

    /// Validate and replace. Returns false when the id is unknown.
    async fn update(&self, id: &str, subscription: Subscription) -> Result<bool>;

    /// Returns false when the id is unknown.
    async fn delete(&self, id: &str) -> bool;
}

/// In-memory subscription store
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn list(&self) -> Vec<Subscription> {
        let subscriptions = self.subscriptions.read().await;
        subscriptions.values().cloned().collect()
    }

    async fn get(&self, id: &str) -> Option<Subscription> {
        let subscriptions = self.subscriptions.read().await;
        subscriptions.get(id).cloned()
    }

    async fn add(&self, mut subscription: Subscription) -> Result<String> {
        subscription.validate()?;

        let id = format!("webhook_{}", Uuid::new_v4());
        subscription.id = id.clone();
        subscription.enabled = true;
        subscription.created_at = Utc::now();

        info!("Subscription added: {} -> {}", id, subscription.url);
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(id.clone(), subscription);
        Ok(id)
    }

    async fn update(&self, id: &str, mut subscription: Subscription) -> Result<bool> {
        subscription.validate()?;

        let mut subscriptions = self.subscriptions.write().await;
        if !subscriptions.contains_key(id) {
            return Ok(false);
        }
        // The id is identity; callers cannot change it through update.
        subscription.id = id.to_string();
        subscriptions.insert(id.to_string(), subscription);
        Ok(true)
    }

    async fn delete(&self, id: &str) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let removed = subscriptions.remove(id).is_some();
        if removed {
            info!("Subscription deleted: {}", id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(bundle: &str) -> EntityDescriptor {
        EntityDescriptor::new("node", bundle, "1", Uuid::new_v4())
    }

    #[test]
    fn test_matches_event_filter() {
        let mut sub = Subscription::new("blog", "https://example.com/hook");
        sub.events = vec![EventKind::Create, EventKind::Update];

        assert!(sub.matches(&node("article"), EventKind::Create));
        assert!(!sub.matches(&node("article"), EventKind::Delete));
    }

    #[test]
    fn test_matches_entity_type_filter() {
        let sub = Subscription::new("blog", "https://example.com/hook");
        let term = EntityDescriptor::new("taxonomy_term", "tags", "4", Uuid::new_v4());

        assert!(!sub.matches(&term, EventKind::Create));
    }

    #[test]
    fn test_matches_bundle_filter() {
        let mut sub = Subscription::new("blog", "https://example.com/hook");
        sub.bundles = vec!["article".to_string()];

        assert!(sub.matches(&node("article"), EventKind::Create));
        assert!(!sub.matches(&node("page"), EventKind::Create));
    }

    #[test]
    fn test_empty_bundles_match_all() {
        let sub = Subscription::new("blog", "https://example.com/hook");
        assert!(sub.matches(&node("article"), EventKind::Update));
        assert!(sub.matches(&node("page"), EventKind::Update));
    }

    #[test]
    fn test_disabled_never_matches() {
        let mut sub = Subscription::new("blog", "https://example.com/hook");
        sub.enabled = false;
        assert!(!sub.matches(&node("article"), EventKind::Create));
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_enables() {
        let store = MemorySubscriptionStore::new();
        let mut sub = Subscription::new("blog", "https://example.com/hook");
        sub.enabled = false;

        let id = store.add(sub).await.unwrap();
        assert!(id.starts_with("webhook_"));

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.id, id);
        assert!(stored.enabled);
    }

    #[tokio::test]
    async fn test_add_rejects_malformed() {
        let store = MemorySubscriptionStore::new();

        let err = store.add(Subscription::new("x", "not a url")).await.unwrap_err();
        assert!(matches!(err, WebhookError::Configuration(_)));

        let err = store
            .add(Subscription::new("x", "ftp://example.com/hook"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Configuration(_)));

        let mut no_events = Subscription::new("x", "https://example.com/hook");
        no_events.events.clear();
        assert!(store.add(no_events).await.is_err());

        let mut no_types = Subscription::new("x", "https://example.com/hook");
        no_types.entity_types.clear();
        assert!(store.add(no_types).await.is_err());

        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_preserves_id() {
        let store = MemorySubscriptionStore::new();
        let id = store
            .add(Subscription::new("blog", "https://example.com/hook"))
            .await
            .unwrap();

        let mut updated = Subscription::new("renamed", "https://example.com/hook2");
        updated.id = "webhook_forged".to_string();
        assert!(store.update(&id, updated).await.unwrap());

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.label, "renamed");
        assert!(store.get("webhook_forged").await.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemorySubscriptionStore::new();
        let sub = Subscription::new("blog", "https://example.com/hook");
        assert!(!store.update("webhook_missing", sub).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemorySubscriptionStore::new();
        let id = store
            .add(Subscription::new("blog", "https://example.com/hook"))
            .await
            .unwrap();

        assert!(store.delete(&id).await);
        assert!(!store.delete(&id).await);
        assert!(store.get(&id).await.is_none());
    }
}
