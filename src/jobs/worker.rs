use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::jobs::executor::JobExecutor;
use crate::jobs::registry::JobRegistry;
use crate::jobs::types::{JobOutcome, QueuedJob};

/// Consumer side of the job queue.
///
/// Several workers share one receiver; each takes the next job, runs it
/// through the executor and logs the outcome.
pub struct JobWorker {
    registry: Arc<JobRegistry>,
    executor: Arc<JobExecutor>,
}

impl JobWorker {
    pub fn new(registry: JobRegistry, executor: JobExecutor) -> Self {
        Self {
            registry: Arc::new(registry),
            executor: Arc::new(executor),
        }
    }

    /// Starts `workers` tasks that drain `receiver` until `token` is cancelled
    /// or every sender is gone.
    pub fn spawn(
        self,
        receiver: mpsc::Receiver<QueuedJob>,
        workers: usize,
        token: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let worker = Arc::new(self);
        let receiver = Arc::new(Mutex::new(receiver));

        (0..workers.max(1))
            .map(|worker_id| {
                let worker = worker.clone();
                let receiver = receiver.clone();
                let token = token.clone();
                tokio::spawn(async move { worker.run(worker_id, receiver, token).await })
            })
            .collect()
    }

    async fn run(
        &self,
        worker_id: usize,
        receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
        token: CancellationToken,
    ) {
        tracing::debug!(worker_id, "Job worker started");

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => None,
                job = async { receiver.lock().await.recv().await } => job,
            };

            let Some(job) = next else {
                break;
            };
            self.process(job, &token).await;
        }

        tracing::debug!(worker_id, "Job worker stopped");
    }

    /// Runs one job and logs how it ended.
    pub async fn process(&self, job: QueuedJob, token: &CancellationToken) -> JobOutcome {
        let task = match self.registry.create_task(&job.task_type, job.payload.clone()) {
            Ok(task) => task,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    task_type = %job.task_type,
                    error = %e,
                    "Job could not be decoded"
                );
                return JobOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                };
            }
        };

        let outcome = self.executor.execute(&job, task.as_ref(), token).await;

        match &outcome {
            JobOutcome::Succeeded { attempts } => tracing::info!(
                job_id = %job.id,
                task_type = %job.task_type,
                attempts,
                "Job completed"
            ),
            JobOutcome::Failed { attempts, error } => tracing::error!(
                job_id = %job.id,
                task_type = %job.task_type,
                attempts,
                error = %error,
                "Job failed after exhausting retries"
            ),
            JobOutcome::Cancelled { attempts } => tracing::warn!(
                job_id = %job.id,
                task_type = %job.task_type,
                attempts,
                "Job cancelled during shutdown"
            ),
        }

        outcome
    }
}
