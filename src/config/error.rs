//! Errors raised while loading or validating settings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Sources merged but did not deserialize into `Settings`
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value is outside what the application accepts
    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// `ACCOUNTS_APP_ENV` holds an unknown environment name
    #[error("Environment variable error: {0}")]
    EnvVarError(String),

    /// `ACCOUNTS_CONFIG_DIR` and `ACCOUNTS_CONFIG_FILE` are both set
    #[error("Conflicting configuration sources: {0}")]
    MutualExclusivityError(String),

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }

    /// Setting key the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ConfigError::validation("jwt.secret", "too short");
        assert_eq!(err.field(), Some("jwt.secret"));
        assert_eq!(err.to_string(), "Invalid jwt.secret: too short");
        assert_eq!(ConfigError::file_not_found("x.toml").field(), None);
    }
}
