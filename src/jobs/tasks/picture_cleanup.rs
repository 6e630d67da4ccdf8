use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};

/// Removes a replaced or orphaned profile picture from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureCleanupTask {
    pub url: String,
}

impl PictureCleanupTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl JobTask for PictureCleanupTask {
    fn task_type() -> &'static str
    where
        Self: Sized,
    {
        "picture_cleanup"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        ctx.uploader.delete_file(&self.url).await?;

        tracing::info!(
            job_id = %ctx.job_id,
            attempt = ctx.attempt,
            url = %self.url,
            "Picture removed"
        );

        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some(format!("Delete stored picture {}", self.url))
    }
}
