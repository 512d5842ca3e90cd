// Error types for the webhook dispatch engine
//
// Configuration problems are rejected at subscription write time; everything
// that happens on the delivery path is recorded in the delivery log instead
// of being surfaced to the content layer.

/// Error types for webhook operations
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Malformed subscription rejected at store write time
    #[error("Invalid subscription: {0}")]
    Configuration(String),

    /// Unknown subscription id
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Delivery queue rejected an enqueue (engine shut down)
    #[error("Delivery queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Payload could not be encoded as JSON
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
