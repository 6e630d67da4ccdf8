//! Deployment environment, selecting the `{environment}.toml` layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "ACCOUNTS_APP_ENV";

    const ALL: [Environment; 4] = [
        Environment::Development,
        Environment::Test,
        Environment::Staging,
        Environment::Production,
    ];

    /// Reads `ACCOUNTS_APP_ENV`; unset or unknown values mean development.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to development environment");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Test => "test",
            Environment::Staging => "stage",
            Environment::Production => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    /// Accepts full and short names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == wanted || env.short_name() == wanted)
            .ok_or_else(|| {
                ConfigError::EnvVarError(format!(
                    "Unknown environment '{s}', expected development, test, staging or production"
                ))
            })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_short_names() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
            assert_eq!(env.short_name().parse::<Environment>().unwrap(), env);
        }
    }

    #[test]
    fn test_parsing_ignores_case_and_whitespace() {
        assert_eq!(" Production ".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Development);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!(matches!(
            "qa".parse::<Environment>(),
            Err(ConfigError::EnvVarError(_))
        ));
    }

    #[test]
    fn test_display_and_default() {
        assert_eq!(Environment::Staging.to_string(), "staging");
        assert_eq!(Environment::default(), Environment::Development);
    }
}
