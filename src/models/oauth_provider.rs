use std::str::FromStr;

use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Identity provider an account can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::OauthProvider")]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Local,
    Google,
    Facebook,
    Github,
    Microsoft,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Local => "local",
            OAuthProvider::Google => "google",
            OAuthProvider::Facebook => "facebook",
            OAuthProvider::Github => "github",
            OAuthProvider::Microsoft => "microsoft",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(OAuthProvider::Local),
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            "github" => Ok(OAuthProvider::Github),
            "microsoft" => Ok(OAuthProvider::Microsoft),
            _ => Err(AppError::NotFound {
                entity: "oauth_provider".to_string(),
                field: "name".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Link row between a user and a provider.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::user_oauth_providers)]
pub struct NewUserOAuthProvider {
    pub user_id: i32,
    pub provider: OAuthProvider,
}
