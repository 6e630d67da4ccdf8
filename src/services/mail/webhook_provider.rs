//! Mail relay provider.
//!
//! Posts each message as JSON to an HTTP mail relay using the global HTTP_CLIENT.

use std::time::Instant;

use async_trait::async_trait;

use super::provider::{MailMessage, MailProvider};
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

/// Webhook mail provider
///
/// # Example
/// ```ignore
/// let provider = WebhookMailProvider::new("https://relay.example.com/send", Some(key));
/// provider.send(&message).await?;
/// ```
pub struct WebhookMailProvider {
    url: String,
    api_key: Option<String>,
}

impl WebhookMailProvider {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MailProvider for WebhookMailProvider {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        let start = Instant::now();

        let mut request = HTTP_CLIENT.post(&self.url).json(message);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(AppError::internal)?;
        let status = response.status();
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::internal(anyhow::anyhow!(
                "Mail relay responded {}: {}",
                status,
                body
            )));
        }

        tracing::debug!(to = %message.to, status = status.as_u16(), duration_ms, "Mail relayed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
