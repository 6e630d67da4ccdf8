//! Serve command handler

use crate::config::settings::Settings;
use crate::models::OAuthProvider;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the server, or with `dry_run` only reports the checked configuration.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()?;
            return Ok(());
        }
        Server::new(self.config).run().await
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;

        let providers: Vec<&str> = [
            OAuthProvider::Google,
            OAuthProvider::Facebook,
            OAuthProvider::Github,
            OAuthProvider::Microsoft,
        ]
        .into_iter()
        .filter(|provider| self.config.auth.oauth.client(*provider).is_some())
        .map(|provider| provider.as_str())
        .collect();
        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Cache backend: {:?}", self.config.cache.backend);
        println!("✓ Mail backend: {:?}", self.config.mail.backend);
        println!("✓ Storage bucket: {}", self.config.storage.bucket);
        println!("✓ OAuth providers: [{}]", providers.join(", "));
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/test".to_string();
        config.jwt.secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[tokio::test]
    async fn test_dry_run_accepts_valid_config() {
        let handler = ServeCommandHandler::new(valid_config());
        assert_eq!(handler.config().database.url, "postgres://localhost/test");
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_rejects_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(ServeCommandHandler::new(config).execute(true).await.is_err());
    }
}
