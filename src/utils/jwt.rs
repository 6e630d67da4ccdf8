use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Access token for API authentication (short-lived)
    Access,
    /// Refresh token for obtaining new access tokens (long-lived)
    Refresh,
    /// Email confirmation link
    Confirmation,
    /// Forgot-password link
    ResetPassword,
}

impl TokenType {
    /// Configured lifetime in hours.
    pub fn expiration_hours(self, config: &JwtConfig) -> i64 {
        match self {
            TokenType::Access => config.access_token_expiration,
            TokenType::Refresh => config.refresh_token_expiration,
            TokenType::Confirmation => config.confirmation_token_expiration,
            TokenType::ResetPassword => config.reset_password_token_expiration,
        }
    }
}

/// JWT Claims structure
///
/// `version` mirrors the user's credentials version at issue time; a token
/// whose version no longer matches is stale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Credentials version
    pub version: i32,
    pub token_type: TokenType,
    /// Unique token id, used for blacklisting
    pub jti: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user
    pub fn new(user_id: i32, version: i32, token_type: TokenType, expiration_hours: i64) -> Self {
        let now = jiff::Timestamp::now().as_second();

        Self {
            sub: user_id.to_string(),
            version,
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expiration_hours * 3600,
        }
    }

    /// User id carried in `sub`.
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject"))
    }

    /// Seconds until expiry, zero once expired.
    pub fn remaining_seconds(&self) -> u64 {
        let now = jiff::Timestamp::now().as_second();
        u64::try_from(self.exp - now).unwrap_or(0)
    }
}

/// Signs `claims` with the HS256 secret.
pub fn encode_claims(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Generates a signed token and returns it with its claims
///
/// # Example
/// ```ignore
/// let (token, claims) = generate_token(1, 0, TokenType::Access, &settings.jwt)?;
/// ```
pub fn generate_token(
    user_id: i32,
    version: i32,
    token_type: TokenType,
    config: &JwtConfig,
) -> AppResult<(String, Claims)> {
    let claims = Claims::new(
        user_id,
        version,
        token_type,
        token_type.expiration_hours(config),
    );
    let token = encode_claims(&claims, &config.secret)?;
    Ok((token, claims))
}

/// Validates and decodes a JWT token
///
/// When `expected_type` is given, tokens of any other type are rejected.
pub fn validate_token(
    token: &str,
    secret: &str,
    expected_type: Option<TokenType>,
) -> AppResult<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::unauthorized("Token has expired")
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::unauthorized("Invalid token"),
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AppError::unauthorized("Invalid token signature")
        }
        _ => AppError::unauthorized(format!("Token validation failed: {}", e)),
    })?;

    if let Some(expected) = expected_type
        && claims.token_type != expected
    {
        return Err(AppError::unauthorized(format!(
            "Invalid token type: expected {:?}, got {:?}",
            expected, claims.token_type
        )));
    }

    Ok(claims)
}
