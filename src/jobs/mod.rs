//! Background job queue.
//!
//! Work that must not hold up a request (deleting replaced pictures) is
//! pushed onto a bounded in-process queue and executed by workers with a
//! per-attempt timeout and exponential backoff between retries.

pub mod error;
pub mod executor;
pub mod queue;
pub mod registry;
pub mod tasks;
pub mod types;
pub mod worker;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use error::{JobError, JobResult};
pub use executor::{JobExecutor, RetryPolicy};
pub use queue::JobQueue;
pub use registry::JobRegistry;
pub use types::{JobContext, JobOutcome, JobTask, QueuedJob};
pub use worker::JobWorker;

use crate::config::JobsConfig;
use crate::external::storage::Uploader;

/// Registry with every task type the application enqueues.
pub fn default_registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register::<tasks::PictureCleanupTask>();
    registry
}

/// Creates the queue and, when enabled, starts its workers.
pub fn start(
    config: &JobsConfig,
    uploader: Arc<dyn Uploader>,
    token: CancellationToken,
) -> (JobQueue, Vec<JoinHandle<()>>) {
    if !config.enabled {
        tracing::warn!("Background jobs disabled; cleanup tasks will be dropped");
        return (JobQueue::disabled(), Vec::new());
    }

    let (queue, receiver) = JobQueue::bounded(config.queue_capacity);
    let executor = JobExecutor::new(RetryPolicy::from(config), uploader);
    let handles =
        JobWorker::new(default_registry(), executor).spawn(receiver, config.workers, token);

    tracing::info!(
        workers = config.workers,
        capacity = config.queue_capacity,
        "Job workers started"
    );

    (queue, handles)
}
