//! Account emails: confirmation and password reset.

use std::sync::Arc;

use super::log_provider::LogMailProvider;
use super::provider::{MailMessage, MailProvider};
use super::webhook_provider::WebhookMailProvider;
use crate::config::{ApplicationConfig, MailBackend, MailConfig};
use crate::error::{AppError, AppResult};
use crate::models::User;

/// Renders account emails and hands them to the configured provider.
#[derive(Clone)]
pub struct MailService {
    provider: Arc<dyn MailProvider>,
    from: String,
    app_name: String,
    frontend_url: String,
}

impl MailService {
    pub fn new(provider: Arc<dyn MailProvider>, mail: &MailConfig, app: &ApplicationConfig) -> Self {
        Self {
            provider,
            from: mail.from.clone(),
            app_name: app.name.clone(),
            frontend_url: app.frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the provider selected by `mail.backend`.
    pub fn provider_from_config(mail: &MailConfig) -> AppResult<Arc<dyn MailProvider>> {
        let provider: Arc<dyn MailProvider> = match mail.backend {
            MailBackend::Log => Arc::new(LogMailProvider),
            MailBackend::Webhook => {
                let url = mail.webhook_url.clone().ok_or_else(|| AppError::Configuration {
                    key: "mail.webhook_url".to_string(),
                    source: anyhow::anyhow!("required for the webhook backend"),
                })?;
                Arc::new(WebhookMailProvider::new(url, mail.api_key.clone()))
            }
        };
        tracing::info!(provider = provider.name(), "Mail provider configured");
        Ok(provider)
    }

    pub async fn send_confirmation_email(&self, user: &User, token: &str) -> AppResult<()> {
        let link = format!("{}/auth/confirm-email?token={}", self.frontend_url, token);
        let message = MailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: format!("Confirm your {} account", self.app_name),
            text: format!(
                "Hello {},\n\nWelcome to {}. Confirm your email address by opening:\n\n{}\n",
                user.name, self.app_name, link
            ),
        };
        self.provider.send(&message).await
    }

    pub async fn send_reset_password_email(&self, user: &User, token: &str) -> AppResult<()> {
        let link = format!("{}/auth/reset-password?token={}", self.frontend_url, token);
        let message = MailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: format!("Reset your {} password", self.app_name),
            text: format!(
                "Hello {},\n\nA password reset was requested for your account. Choose a new password here:\n\n{}\n\nIf you did not ask for this, ignore this email.\n",
                user.name, link
            ),
        };
        self.provider.send(&message).await
    }
}
