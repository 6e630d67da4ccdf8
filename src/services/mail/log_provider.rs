use async_trait::async_trait;

use super::provider::{MailMessage, MailProvider};
use crate::error::AppResult;

/// Writes messages to the log instead of delivering them; for development.
#[derive(Debug, Default)]
pub struct LogMailProvider;

#[async_trait]
impl MailProvider for LogMailProvider {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "Mail not delivered (log backend)");
        tracing::debug!(body = %message.text, "Mail body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
