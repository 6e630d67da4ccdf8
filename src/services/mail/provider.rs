//! Mail provider trait and message type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// A rendered message ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Delivery backend for outgoing mail.
///
/// Uses `async_trait` to support async methods with dynamic dispatch.
#[async_trait]
pub trait MailProvider: Send + Sync {
    async fn send(&self, message: &MailMessage) -> AppResult<()>;

    /// Returns the provider name for logging/debugging
    fn name(&self) -> &'static str;
}
