use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::storage::Uploader;

/// Job execution context passed to tasks
#[derive(Clone)]
pub struct JobContext {
    pub job_id: Uuid,
    pub task_type: String,
    /// Zero-based attempt number
    pub attempt: u32,
    pub uploader: Arc<dyn Uploader>,
    pub cancellation_token: CancellationToken,
}

/// A serialized task waiting in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub task_type: String,
    pub payload: JsonValue,
}

/// Final state of a job once the executor is done with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, error: String },
    Cancelled { attempts: u32 },
}

impl JobOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            JobOutcome::Succeeded { attempts }
            | JobOutcome::Failed { attempts, .. }
            | JobOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// Trait that all job tasks must implement
#[async_trait]
pub trait JobTask: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this task type
    fn task_type() -> &'static str
    where
        Self: Sized;

    /// Execute the task
    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    /// Optional description
    fn description(&self) -> Option<String> {
        None
    }
}
