use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Job execution timeout after {0}s")]
    Timeout(u64),

    #[error("Unknown job type: {0}")]
    UnknownTask(String),

    #[error("Job queue is full")]
    QueueFull,

    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Job queue is disabled")]
    Disabled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type JobResult<T> = Result<T, JobError>;
