//! End-to-end tests for the webhook dispatch engine
//!
//! Drives the full path — publish, match, queue, worker delivery, log —
//! against local endpoint doubles.

use anyhow::Result;
use headless_webhooks::signature;
use headless_webhooks::{
    DeliveryOutcome, EngineConfig, EntityDescriptor, EventKind, Publisher, Subscription,
    SubscriptionStore, WebhookEngine,
};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> EngineConfig {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    EngineConfig { worker_count: 2, base_delay_ms: 0, ..Default::default() }
}

fn article(id: &str) -> EntityDescriptor {
    EntityDescriptor::new("node", "article", id, Uuid::new_v4())
}

async fn wait_for_entries(engine: &WebhookEngine, n: usize) {
    let log = engine.delivery_log();
    tokio::time::timeout(Duration::from_secs(5), async {
        while log.len().await < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected delivery log entries never appeared");
}

#[tokio::test]
async fn test_create_event_delivered_signed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = WebhookEngine::new(fast_config());
    let mut sub = Subscription::new("blog frontend", format!("{}/hook", server.uri()));
    sub.secret = "s3cret".to_string();
    engine.subscriptions().add(sub).await?;
    engine.start();

    let entity = article("42");
    engine.publisher().publish(&entity, EventKind::Create).await;

    wait_for_entries(&engine, 1).await;
    engine.shutdown().await;

    let entries = engine.delivery_log().recent(10).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, DeliveryOutcome::Success);
    assert_eq!(entries[0].status_code, Some(200));

    // The receiver sees the documented wire format and a valid signature
    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let sig = request.headers.get("X-Webhook-Signature").unwrap().to_str()?;
    assert!(signature::verify(&request.body, "s3cret", sig));

    let body: serde_json::Value = serde_json::from_slice(&request.body)?;
    assert_eq!(body["event"], "create");
    assert_eq!(body["entity_type"], "node");
    assert_eq!(body["entity_bundle"], "article");
    assert_eq!(body["entity_id"], "42");
    assert_eq!(body["entity_uuid"], entity.uuid.to_string());
    assert!(body["timestamp"].is_i64());
    Ok(())
}

#[tokio::test]
async fn test_failing_endpoint_gets_three_attempts_total() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut engine = WebhookEngine::new(fast_config());
    engine
        .subscriptions()
        .add(Subscription::new("flaky", format!("{}/hook", server.uri())))
        .await?;
    engine.start();

    engine.publisher().publish(&article("1"), EventKind::Update).await;

    wait_for_entries(&engine, 3).await;
    // A fourth attempt would arrive within this window
    tokio::time::sleep(Duration::from_millis(150)).await;
    engine.shutdown().await;

    let entries = engine.delivery_log().recent(10).await;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.outcome == DeliveryOutcome::Failed));
    // expect(3) verifies no fourth request on drop
    Ok(())
}

#[tokio::test]
async fn test_event_and_bundle_filters_end_to_end() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut engine = WebhookEngine::new(fast_config());
    let store = engine.subscriptions();

    let mut articles_only = Subscription::new("articles", format!("{}/articles", server.uri()));
    articles_only.events = vec![EventKind::Create];
    articles_only.bundles = vec!["article".to_string()];
    store.add(articles_only).await?;

    store
        .add(Subscription::new("everything", format!("{}/everything", server.uri())))
        .await?;

    engine.start();

    let publisher = engine.publisher();
    // Matches both subscriptions
    publisher.publish(&article("1"), EventKind::Create).await;
    // Wrong bundle for the first, still matches the second
    publisher
        .publish(
            &EntityDescriptor::new("node", "page", "2", Uuid::new_v4()),
            EventKind::Create,
        )
        .await;
    // Wrong entity type for both
    publisher
        .publish(
            &EntityDescriptor::new("taxonomy_term", "tags", "3", Uuid::new_v4()),
            EventKind::Create,
        )
        .await;

    wait_for_entries(&engine, 3).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.shutdown().await;

    assert_eq!(engine.delivery_log().len().await, 3);
    // Mock expectations verify the per-endpoint request counts on drop
    Ok(())
}

#[tokio::test]
async fn test_concurrent_publishes_all_delivered() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(20)
        .mount(&server)
        .await;

    let config = EngineConfig { worker_count: 4, ..fast_config() };
    let mut engine = WebhookEngine::new(config);
    engine
        .subscriptions()
        .add(Subscription::new("firehose", format!("{}/hook", server.uri())))
        .await?;
    engine.start();

    let publisher = engine.publisher();
    let publishes = (0..20)
        .map(|n| {
            let publisher = publisher.clone();
            async move {
                publisher.publish(&article(&n.to_string()), EventKind::Update).await;
            }
        })
        .collect::<Vec<_>>();
    futures::future::join_all(publishes).await;

    wait_for_entries(&engine, 20).await;
    engine.shutdown().await;

    let entries = engine.delivery_log().recent(100).await;
    assert_eq!(entries.len(), 20);
    assert!(entries.iter().all(|e| e.outcome == DeliveryOutcome::Success));
    Ok(())
}

#[tokio::test]
async fn test_shutdown_drains_visible_jobs() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&server)
        .await;

    let mut engine = WebhookEngine::new(fast_config());
    engine
        .subscriptions()
        .add(Subscription::new("drain", format!("{}/hook", server.uri())))
        .await?;

    // Queue work before any worker runs
    let publisher = engine.publisher();
    for n in 0..5 {
        publisher.publish(&article(&n.to_string()), EventKind::Create).await;
    }

    engine.start();
    engine.shutdown().await;

    // Everything visible at shutdown was still delivered
    assert_eq!(engine.delivery_log().len().await, 5);
    Ok(())
}
