//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{
    ApplicationConfig, AuthConfig, CacheBackend, CacheConfig, DatabaseConfig, FileSettings,
    JobsConfig, LoggerSettings, MailBackend, MailConfig, OAuthClientConfig, ServerConfig,
    Settings, StorageConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl ApplicationConfig {
    /// Validate application configuration
    ///
    /// # Validation Rules
    /// - Frontend URL must be an http(s) URL without a trailing slash
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.frontend_url) {
            return Err(ConfigError::validation(
                "application.frontend_url",
                "Frontend URL must start with http:// or https://.",
            ));
        }

        if self.frontend_url.ends_with('/') {
            return Err(ConfigError::validation(
                "application.frontend_url",
                "Frontend URL must not end with a slash.",
            ));
        }

        Ok(())
    }
}

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must be a PostgreSQL connection string
    /// - Max and min connections must be greater than 0
    /// - Min connections must not exceed max connections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.is_valid_database_url() {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }

    fn is_valid_database_url(&self) -> bool {
        ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl OAuthClientConfig {
    fn validate(&self, provider: &str) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("auth.oauth.{provider}"),
                message: "client_id and client_secret are required.".to_string(),
            });
        }

        if !is_http_url(&self.redirect_url) {
            return Err(ConfigError::ValidationError {
                field: format!("auth.oauth.{provider}.redirect_url"),
                message: "Redirect URL must start with http:// or https://.".to_string(),
            });
        }

        Ok(())
    }
}

impl AuthConfig {
    /// Validate auth configuration
    ///
    /// # Validation Rules
    /// - Session and OAuth state TTLs must be greater than 0
    /// - Every configured OAuth provider needs credentials and a redirect URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl == 0 {
            return Err(ConfigError::validation(
                "auth.session_ttl",
                "Session TTL must be greater than 0 seconds.",
            ));
        }

        if self.oauth_state_ttl == 0 {
            return Err(ConfigError::validation(
                "auth.oauth_state_ttl",
                "OAuth state TTL must be greater than 0 seconds.",
            ));
        }

        let providers = [
            ("google", &self.oauth.google),
            ("facebook", &self.oauth.facebook),
            ("github", &self.oauth.github),
            ("microsoft", &self.oauth.microsoft),
        ];
        for (name, client) in providers {
            if let Some(client) = client {
                client.validate(name)?;
            }
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl JobsConfig {
    /// Validate job queue configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "jobs.queue_capacity",
                "Queue capacity must be greater than 0.",
            ));
        }

        if self.workers == 0 {
            return Err(ConfigError::validation(
                "jobs.workers",
                "At least one worker is required.",
            ));
        }

        if self.job_timeout == 0 {
            return Err(ConfigError::validation(
                "jobs.job_timeout",
                "Job timeout must be greater than 0 seconds.",
            ));
        }

        if !self.retry_backoff_multiplier.is_finite() || self.retry_backoff_multiplier < 1.0 {
            return Err(ConfigError::validation(
                "jobs.retry_backoff_multiplier",
                "Retry backoff multiplier must be a finite number of at least 1.0.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        match self.backend {
            CacheBackend::Memory if self.memory.max_size == 0 => Err(ConfigError::validation(
                "cache.memory.max_size",
                "Memory cache size must be greater than 0.",
            )),
            CacheBackend::Redis if !self.redis.url.starts_with("redis") => {
                Err(ConfigError::validation(
                    "cache.redis.url",
                    "Redis URL must start with redis:// or rediss://.",
                ))
            }
            CacheBackend::Redis if self.redis.pool_size == 0 => Err(ConfigError::validation(
                "cache.redis.pool_size",
                "Redis pool size must be greater than 0.",
            )),
            _ => Ok(()),
        }
    }
}

impl StorageConfig {
    /// Validate object storage configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::validation(
                "storage.bucket",
                "Storage bucket is required.",
            ));
        }

        if !is_http_url(&self.public_url) || self.public_url.ends_with('/') {
            return Err(ConfigError::validation(
                "storage.public_url",
                "Public URL must be an http(s) URL without a trailing slash.",
            ));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::validation(
                "storage.max_file_size",
                "Max file size must be greater than 0.",
            ));
        }

        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "storage.access_key_id and storage.secret_access_key must be set together.",
            ));
        }

        Ok(())
    }
}

impl MailConfig {
    /// Validate mail configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.from.contains('@') {
            return Err(ConfigError::validation(
                "mail.from",
                "Sender must be an email address.",
            ));
        }

        if self.backend == MailBackend::Webhook
            && !self.webhook_url.as_deref().is_some_and(is_http_url)
        {
            return Err(ConfigError::validation(
                "mail.webhook_url",
                "The webhook backend requires an http(s) webhook_url.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.application.validate()?;
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.auth.validate()?;
        self.logger.validate()?;
        self.jobs.validate()?;
        self.cache.validate()?;
        self.storage.validate()?;
        self.mail.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{JwtConfig, OAuthSettings};

    fn valid_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "a".repeat(32),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_settings_valid() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.port");
    }

    #[test]
    fn test_server_config_invalid_timeouts() {
        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.request_timeout"
        );

        let config = ServerConfig {
            keep_alive_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.keep_alive_timeout"
        );
    }

    #[test]
    fn test_database_config_requires_postgres_url() {
        assert_eq!(
            field_of(DatabaseConfig::default().validate().unwrap_err()),
            "database.url"
        );

        for url in ["mysql://localhost/db", "invalid-url", "sqlite://db"] {
            let config = DatabaseConfig {
                url: url.to_string(),
                ..Default::default()
            };
            assert_eq!(field_of(config.validate().unwrap_err()), "database.url");
        }

        for url in ["postgres://localhost/db", "postgresql://u:p@host:5432/db"] {
            let config = DatabaseConfig {
                url: url.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "URL should be valid: {}", url);
        }
    }

    #[test]
    fn test_database_config_min_exceeds_max() {
        let config = DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 5,
            min_connections: 10,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "database.min_connections"
        );
    }

    #[test]
    fn test_frontend_url_rules() {
        let mut settings = valid_settings();
        settings.application.frontend_url = "localhost:5173".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "application.frontend_url"
        );

        settings.application.frontend_url = "https://app.example.com/".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "application.frontend_url"
        );
    }

    #[test]
    fn test_auth_config_rules() {
        let config = AuthConfig {
            session_ttl: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "auth.session_ttl");

        let config = AuthConfig {
            oauth: OAuthSettings {
                google: Some(OAuthClientConfig {
                    client_id: "".to_string(),
                    client_secret: "secret".to_string(),
                    redirect_url: "http://localhost/cb".to_string(),
                    authorize_url: None,
                    token_url: None,
                    userinfo_url: None,
                    scopes: Vec::new(),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "auth.oauth.google");
    }

    #[test]
    fn test_logger_settings_rules() {
        let settings = LoggerSettings {
            level: "invalid".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");

        let settings = LoggerSettings {
            file: FileSettings {
                enabled: true,
                path: "".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.file.path");

        let settings = LoggerSettings {
            file: FileSettings {
                format: "FULL".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_jobs_config_rules() {
        let config = JobsConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "jobs.workers");

        let config = JobsConfig {
            retry_backoff_multiplier: 0.5,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "jobs.retry_backoff_multiplier"
        );
    }

    #[test]
    fn test_cache_config_rules() {
        let mut config = CacheConfig {
            backend: CacheBackend::Redis,
            ..Default::default()
        };
        config.redis.url = "http://not-redis".to_string();
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.redis.url");

        config.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_config_rules() {
        let config = StorageConfig {
            bucket: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "storage.bucket");

        let config = StorageConfig {
            access_key_id: Some("key".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::MutualExclusivityError(_)
        ));
    }

    #[test]
    fn test_mail_config_rules() {
        let config = MailConfig {
            backend: MailBackend::Webhook,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "mail.webhook_url");

        let config = MailConfig {
            backend: MailBackend::Webhook,
            webhook_url: Some("https://relay.example.com/send".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_invalid_jwt() {
        let mut settings = valid_settings();
        settings.jwt.secret = String::new();
        assert_eq!(field_of(settings.validate().unwrap_err()), "jwt.secret");
    }
}
