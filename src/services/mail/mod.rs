//! Outgoing mail with pluggable providers.

mod log_provider;
mod mail_service;
mod provider;
mod webhook_provider;

pub use log_provider::LogMailProvider;
pub use mail_service::MailService;
pub use provider::{MailMessage, MailProvider};
pub use webhook_provider::WebhookMailProvider;
