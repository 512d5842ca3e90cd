// Delivery workers
//
// Stateless consumers pulling jobs from the queue. Each job is attempted
// once; failures are rescheduled with exponential backoff until the
// attempt budget (3 total attempts) is spent, then dropped. Every attempt
// is recorded in the delivery log.

use crate::config::EngineConfig;
use crate::delivery::{DeliveryResult, DeliverySender};
use crate::log::DeliveryLog;
use crate::queue::{DeliveryJob, DeliveryQueue};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pool of concurrent delivery workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.worker_count` consumers on the queue
    pub fn spawn(
        config: EngineConfig,
        queue: DeliveryQueue,
        sender: Arc<DeliverySender>,
        log: Arc<DeliveryLog>,
    ) -> Self {
        let mut handles = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let config = config.clone();
            let queue = queue.clone();
            let sender = sender.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                debug!("Delivery worker {} started", worker_id);
                while let Some(job) = queue.dequeue().await {
                    process_job(&config, &queue, &sender, &log, job).await;
                }
                debug!("Delivery worker {} stopped", worker_id);
            }));
        }
        Self { handles }
    }

    /// Wait for the workers to drain the queue and exit. The queue must be
    /// closed first or this never returns.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn process_job(
    config: &EngineConfig,
    queue: &DeliveryQueue,
    sender: &DeliverySender,
    log: &DeliveryLog,
    job: DeliveryJob,
) {
    let result = match sender.send(&job.subscription, &job.payload).await {
        Ok(result) => result,
        Err(e) => DeliveryResult {
            success: false,
            status_code: None,
            response_time_ms: 0,
            error: Some(e.to_string()),
        },
    };

    log.append(result.to_log_entry(&job.subscription, &job.payload)).await;

    if result.success {
        return;
    }

    let completed = job.attempt + 1;
    if completed >= config.max_attempts {
        warn!(
            "Dropping delivery to {} after {} attempts",
            job.subscription.url, completed
        );
        return;
    }

    let delay = config.retry_delay(job.attempt);
    debug!(
        "Retrying delivery to {} in {:?} (attempt {} of {})",
        job.subscription.url,
        delay,
        completed + 1,
        config.max_attempts
    );
    if let Err(e) = queue.enqueue_after(job.next_attempt(), delay) {
        warn!("Could not reschedule delivery: {}", e);
    }
}
