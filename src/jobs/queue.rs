use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::types::{JobTask, QueuedJob};

/// Producer side of the background job queue.
///
/// Cloning is cheap. Enqueueing never waits: a full or closed queue is
/// reported to the caller, who decides whether that is worth more than a
/// warning.
#[derive(Clone, Debug)]
pub struct JobQueue {
    sender: Option<mpsc::Sender<QueuedJob>>,
}

impl JobQueue {
    /// Creates a bounded queue and the receiver workers drain.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A queue that drops everything; used when jobs are disabled.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn push<T>(&self, task: &T) -> JobResult<Uuid>
    where
        T: JobTask + Serialize,
    {
        let sender = self.sender.as_ref().ok_or(JobError::Disabled)?;
        let job = QueuedJob {
            id: Uuid::new_v4(),
            task_type: T::task_type().to_string(),
            payload: serde_json::to_value(task)?,
        };
        let id = job.id;

        sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => JobError::QueueFull,
            TrySendError::Closed(_) => JobError::QueueClosed,
        })?;
        Ok(id)
    }

    /// Fire-and-log variant of [`JobQueue::push`] for the request path.
    pub fn enqueue<T>(&self, task: &T) -> Option<Uuid>
    where
        T: JobTask + Serialize,
    {
        match self.push(task) {
            Ok(id) => {
                tracing::debug!(job_id = %id, task_type = T::task_type(), "Job enqueued");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(
                    task_type = T::task_type(),
                    task = ?task,
                    error = %e,
                    "Job dropped"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::tasks::PictureCleanupTask;

    #[tokio::test]
    async fn test_push_serializes_task() {
        let (queue, mut receiver) = JobQueue::bounded(4);
        let id = queue.push(&PictureCleanupTask::new("http://cdn/a.png")).unwrap();

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.task_type, "picture_cleanup");
        assert_eq!(job.payload["url"], "http://cdn/a.png");
    }

    #[test]
    fn test_full_queue_does_not_block() {
        let (queue, _receiver) = JobQueue::bounded(1);
        let task = PictureCleanupTask::new("http://cdn/a.png");

        assert!(queue.enqueue(&task).is_some());
        assert!(matches!(queue.push(&task), Err(JobError::QueueFull)));
        assert!(queue.enqueue(&task).is_none());
    }

    #[test]
    fn test_closed_and_disabled() {
        let (queue, receiver) = JobQueue::bounded(1);
        drop(receiver);
        let task = PictureCleanupTask::new("x");
        assert!(matches!(queue.push(&task), Err(JobError::QueueClosed)));

        assert!(matches!(
            JobQueue::disabled().push(&task),
            Err(JobError::Disabled)
        ));
    }
}
