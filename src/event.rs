// Content-change events and webhook payloads
//
// The content layer describes a mutated entity with an EntityDescriptor.
// A payload is built from it exactly once per triggering event and shared
// as an immutable snapshot by every matching subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message body of manual test deliveries
pub const TEST_MESSAGE: &str = "This is a test delivery from the headless webhooks engine";

/// Content-change event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// Author reference exposed by content entities that carry one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub name: String,
}

/// Snapshot of a mutated entity, handed in by the content layer
///
/// Only `entity_type`, `bundle`, `id` and `uuid` are always present; the
/// optional attributes are set when the source entity exposes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_type: String,
    pub bundle: String,
    pub id: String,
    pub uuid: Uuid,
    pub label: Option<String>,
    pub canonical_url: Option<String>,
    pub published: Option<bool>,
    pub created: Option<DateTime<Utc>>,
    pub changed: Option<DateTime<Utc>>,
    pub author: Option<AuthorRef>,
}

impl EntityDescriptor {
    /// Create a descriptor with the required identity fields
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        id: impl Into<String>,
        uuid: Uuid,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: id.into(),
            uuid,
            label: None,
            canonical_url: None,
            published: None,
            created: None,
            changed: None,
            author: None,
        }
    }
}

/// Webhook payload sent to subscribers
///
/// Serialization is the wire format: struct field order is the canonical
/// key order that signatures are computed over.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Entity(EntityPayload),
    Test(TestPayload),
}

/// Payload for a content-change event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityPayload {
    pub event: EventKind,
    pub entity_type: String,
    pub entity_bundle: String,
    pub entity_id: String,
    pub entity_uuid: Uuid,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(with = "chrono::serde::ts_seconds_option", skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds_option", skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
}

/// Synthetic payload for manual test deliveries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestPayload {
    pub event: String,
    pub message: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Payload {
    /// Build the payload for a content-change event
    pub fn for_entity(entity: &EntityDescriptor, event: EventKind) -> Self {
        Payload::Entity(EntityPayload {
            event,
            entity_type: entity.entity_type.clone(),
            entity_bundle: entity.bundle.clone(),
            entity_id: entity.id.clone(),
            entity_uuid: entity.uuid,
            timestamp: Utc::now(),
            entity_label: entity.label.clone(),
            entity_url: entity.canonical_url.clone(),
            published: entity.published,
            created: entity.created,
            changed: entity.changed,
            author: entity.author.clone(),
        })
    }

    /// Build the synthetic payload used by the manual test entry point
    pub fn test() -> Self {
        Payload::Test(TestPayload {
            event: "test".to_string(),
            message: TEST_MESSAGE.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// One-line description stored in delivery log entries
    pub fn summary(&self) -> String {
        match self {
            Payload::Entity(p) => format!(
                "{} {}/{} #{}",
                p.event, p.entity_type, p.entity_bundle, p.entity_id
            ),
            Payload::Test(_) => "test".to_string(),
        }
    }
}
