use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::JobsConfig;
use crate::external::storage::Uploader;
use crate::jobs::error::JobError;
use crate::jobs::types::{JobContext, JobOutcome, JobTask, QueuedJob};

/// Timeout and retry settings applied to every job.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`: `retry_delay * multiplier^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(self.retry_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }
}

impl From<&JobsConfig> for RetryPolicy {
    fn from(config: &JobsConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.job_timeout),
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay),
            backoff_multiplier: config.retry_backoff_multiplier,
        }
    }
}

/// Executes jobs with retry and timeout
pub struct JobExecutor {
    policy: RetryPolicy,
    uploader: Arc<dyn Uploader>,
}

impl JobExecutor {
    pub fn new(policy: RetryPolicy, uploader: Arc<dyn Uploader>) -> Self {
        Self { policy, uploader }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `task` until it succeeds, exhausts its retries or `token` fires.
    pub async fn execute(
        &self,
        job: &QueuedJob,
        task: &dyn JobTask,
        token: &CancellationToken,
    ) -> JobOutcome {
        let mut last_error = String::new();

        for attempt in 0..=self.policy.max_retries {
            let ctx = JobContext {
                job_id: job.id,
                task_type: job.task_type.clone(),
                attempt,
                uploader: self.uploader.clone(),
                cancellation_token: token.child_token(),
            };

            let start_time = Instant::now();
            let result = tokio::time::timeout(self.policy.timeout, task.execute(ctx)).await;
            let duration_ms = start_time.elapsed().as_millis();

            let error = match result {
                Ok(Ok(())) => {
                    tracing::debug!(
                        job_id = %job.id,
                        task_type = %job.task_type,
                        attempt,
                        duration_ms,
                        "Job succeeded"
                    );
                    return JobOutcome::Succeeded {
                        attempts: attempt + 1,
                    };
                }
                Ok(Err(e)) => JobError::ExecutionFailed(e.to_string()),
                Err(_) => JobError::Timeout(self.policy.timeout.as_secs()),
            };

            tracing::warn!(
                job_id = %job.id,
                task_type = %job.task_type,
                attempt,
                duration_ms,
                error = %error,
                "Job attempt failed"
            );
            last_error = error.to_string();

            if attempt < self.policy.max_retries {
                let delay = self.policy.delay_for(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {
                        return JobOutcome::Cancelled { attempts: attempt + 1 };
                    }
                }
            }
        }

        JobOutcome::Failed {
            attempts: self.policy.max_retries + 1,
            error: last_error,
        }
    }
}
