//! Local authentication flows built on the account service.

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::{OAuthProvider, User};
use crate::services::mail::MailService;
use crate::services::session_service::SessionService;
use crate::services::user_service::UserService;
use crate::utils::jwt::{Claims, TokenType, generate_token, validate_token};
use crate::utils::password::verify_password;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

const HOUR: i64 = 60 * 60;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;

/// Tells a user signing in with their previous password when it changed.
fn password_changed_message(changed_at: i64, now: i64) -> String {
    let elapsed = (now - changed_at).max(0);
    let ago = |count: i64, unit: &str| {
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} {unit}{plural} ago")
    };
    let when = match elapsed {
        e if e >= MONTH => ago(e / MONTH, "month"),
        e if e >= DAY => ago(e / DAY, "day"),
        e if e >= HOUR => ago(e / HOUR, "hour"),
        _ => "recently".to_string(),
    };
    format!("You changed your password {when}")
}

/// A freshly issued access/refresh pair and the user it belongs to.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    sessions: SessionService,
    mail: MailService,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(
        users: UserService,
        sessions: SessionService,
        mail: MailService,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            mail,
            jwt,
        }
    }

    /// Creates a local account and mails a confirmation link.
    pub async fn sign_up(
        &self,
        email: &str,
        name: &str,
        password: &str,
        password_confirmation: &str,
    ) -> AppResult<User> {
        if password != password_confirmation {
            return Err(AppError::bad_request("Passwords do not match"));
        }

        let user = self
            .users
            .create(email, name, OAuthProvider::Local, Some(password))
            .await?;
        self.send_confirmation(&user).await?;
        Ok(user)
    }

    /// Signs in with an email or a username.
    ///
    /// Unconfirmed accounts get a new confirmation email instead of tokens.
    pub async fn sign_in(&self, email_or_username: &str, password: &str) -> AppResult<AuthTokens> {
        let user = if email_or_username.contains('@') {
            self.users.find_one_by_email_for_auth(email_or_username).await?
        } else {
            self.users
                .find_one_by_username_for_auth(email_or_username)
                .await?
        };

        if user.is_oauth_only() || !verify_password(password, &user.password) {
            let credentials = &user.credentials;
            if !credentials.last_password.is_empty()
                && verify_password(password, &credentials.last_password)
            {
                return Err(AppError::unauthorized(password_changed_message(
                    credentials.password_updated_at,
                    jiff::Timestamp::now().as_second(),
                )));
            }
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.confirmed {
            self.send_confirmation(&user).await?;
            return Err(AppError::unauthorized(
                "Please confirm your email, a new email has been sent",
            ));
        }

        self.issue(user).await
    }

    /// Exchanges a refresh token for a new pair; the old token is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let claims = self.verify(refresh_token, TokenType::Refresh).await?;
        let user = self
            .users
            .find_one_by_credentials(claims.user_id()?, claims.version)
            .await?;

        self.sessions.blacklist(&claims).await?;
        self.issue(user).await
    }

    /// Revokes `refresh_token` and clears the session of `user_id`.
    pub async fn logout(&self, user_id: i32, refresh_token: &str) -> AppResult<()> {
        let claims = self.verify(refresh_token, TokenType::Refresh).await?;
        if claims.user_id()? != user_id {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        self.sessions.blacklist(&claims).await?;
        self.sessions.end(user_id).await?;
        tracing::info!(user_id, "User logged out");
        Ok(())
    }

    pub async fn confirm_email(&self, token: &str) -> AppResult<AuthTokens> {
        let claims = validate_token(token, &self.jwt.secret, Some(TokenType::Confirmation))?;
        let user = self
            .users
            .confirm_email(claims.user_id()?, claims.version)
            .await?;
        self.issue(user).await
    }

    /// Mails a reset link when the account exists and is confirmed.
    ///
    /// The outcome is never revealed to the caller.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = match self.users.find_one_by_email(email).await {
            Ok(user) if user.confirmed => user,
            Ok(_) | Err(AppError::NotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };

        let (token, _) = generate_token(
            user.id,
            user.credentials.version,
            TokenType::ResetPassword,
            &self.jwt,
        )?;
        if let Err(e) = self.mail.send_reset_password_email(&user, &token).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to send reset password email");
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirmation: &str,
    ) -> AppResult<User> {
        if password != password_confirmation {
            return Err(AppError::bad_request("Passwords do not match"));
        }

        let claims = validate_token(token, &self.jwt.secret, Some(TokenType::ResetPassword))?;
        self.users
            .reset_password(claims.user_id()?, claims.version, password)
            .await
    }

    /// Changes the password; the new pair replaces every previous token.
    pub async fn update_password(
        &self,
        user_id: i32,
        old_password: Option<&str>,
        password: &str,
        password_confirmation: &str,
    ) -> AppResult<AuthTokens> {
        if password != password_confirmation {
            return Err(AppError::bad_request("Passwords do not match"));
        }

        let user = self
            .users
            .update_password(user_id, old_password, password)
            .await?;
        self.issue(user).await
    }

    /// Resolves the user of an access token, rejecting stale credentials.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<User> {
        let claims = validate_token(access_token, &self.jwt.secret, Some(TokenType::Access))?;
        self.users
            .find_one_by_credentials(claims.user_id()?, claims.version)
            .await
    }

    /// Issues a token pair for `user` and records the session.
    pub(crate) async fn issue(&self, user: User) -> AppResult<AuthTokens> {
        let version = user.credentials.version;
        let (access_token, access) = generate_token(user.id, version, TokenType::Access, &self.jwt)?;
        let (refresh_token, _) = generate_token(user.id, version, TokenType::Refresh, &self.jwt)?;

        self.sessions.start(user.id).await?;

        Ok(AuthTokens {
            user,
            access_token,
            refresh_token,
            expires_in: access.exp - access.iat,
        })
    }

    async fn verify(&self, token: &str, token_type: TokenType) -> AppResult<Claims> {
        let claims = validate_token(token, &self.jwt.secret, Some(token_type))?;
        if self.sessions.is_blacklisted(&claims.jti).await? {
            return Err(AppError::unauthorized("Token has been revoked"));
        }
        Ok(claims)
    }

    async fn send_confirmation(&self, user: &User) -> AppResult<()> {
        let (token, _) = generate_token(
            user.id,
            user.credentials.version,
            TokenType::Confirmation,
            &self.jwt,
        )?;
        if let Err(e) = self.mail.send_confirmation_email(user, &token).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to send confirmation email");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestContext, test_context};

    /// Token embedded in the last mail's link.
    fn last_token(ctx: &TestContext) -> String {
        let message = ctx.mailer.sent().pop().unwrap();
        let start = message.text.find("token=").unwrap() + "token=".len();
        message.text[start..]
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    async fn confirmed_user(ctx: &TestContext) -> AuthTokens {
        ctx.auth
            .sign_up("john@example.com", "John Doe", "password1", "password1")
            .await
            .unwrap();
        let token = last_token(ctx);
        ctx.auth.confirm_email(&token).await.unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_sends_confirmation() {
        let ctx = test_context().await;
        let user = ctx
            .auth
            .sign_up("john@example.com", "John Doe", "password1", "password1")
            .await
            .unwrap();

        assert!(!user.confirmed);
        let sent = ctx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "john@example.com");
        assert!(sent[0].text.contains("/auth/confirm-email?token="));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_mismatched_passwords() {
        let ctx = test_context().await;
        let err = ctx
            .auth
            .sign_up("john@example.com", "John Doe", "password1", "password2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
        assert!(ctx.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_sign_in_resends_confirmation() {
        let ctx = test_context().await;
        ctx.auth
            .sign_up("john@example.com", "John Doe", "password1", "password1")
            .await
            .unwrap();

        let err = ctx
            .auth
            .sign_in("john@example.com", "password1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { message } if message.starts_with("Please confirm")));
        assert_eq!(ctx.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_confirm_then_sign_in_by_email_or_username() {
        let ctx = test_context().await;
        let confirmed = confirmed_user(&ctx).await;
        assert!(confirmed.user.confirmed);
        assert!(ctx.sessions.is_active(confirmed.user.id).await.unwrap());

        let by_email = ctx.auth.sign_in("JOHN@example.com", "password1").await.unwrap();
        let by_username = ctx.auth.sign_in("john-doe", "password1").await.unwrap();
        assert_eq!(by_email.user.id, by_username.user.id);
        assert_eq!(by_email.expires_in, 3600 * ctx.settings.jwt.access_token_expiration);
    }

    #[tokio::test]
    async fn test_sign_in_masks_failures() {
        let ctx = test_context().await;
        confirmed_user(&ctx).await;

        for (login, password) in [
            ("john@example.com", "wrong-password"),
            ("nobody@example.com", "password1"),
            ("nobody", "password1"),
        ] {
            let err = ctx.auth.sign_in(login, password).await.unwrap_err();
            assert!(
                matches!(err, AppError::Unauthorized { ref message } if message == "Invalid credentials"),
                "{login}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_oauth_only_account_cannot_sign_in_locally() {
        let ctx = test_context().await;
        ctx.users
            .create("o@x.com", "Oauth", OAuthProvider::Github, None)
            .await
            .unwrap();

        let err = ctx.auth.sign_in("o@x.com", "UNSET").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_confirmation_token_is_single_use() {
        let ctx = test_context().await;
        ctx.auth
            .sign_up("john@example.com", "John Doe", "password1", "password1")
            .await
            .unwrap();
        let token = last_token(&ctx);

        ctx.auth.confirm_email(&token).await.unwrap();
        assert!(matches!(
            ctx.auth.confirm_email(&token).await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_revokes() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;

        let rotated = ctx.auth.refresh(&tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        let err = ctx.auth.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { message } if message == "Token has been revoked"));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;

        assert!(matches!(
            ctx.auth.refresh(&tokens.access_token).await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_and_ends_session() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;
        let user_id = tokens.user.id;

        assert!(ctx.auth.logout(user_id + 1, &tokens.refresh_token).await.is_err());

        ctx.auth.logout(user_id, &tokens.refresh_token).await.unwrap();
        assert!(!ctx.sessions.is_active(user_id).await.unwrap());
        assert!(ctx.auth.refresh(&tokens.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_in_with_previous_password_says_it_changed() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;
        ctx.auth
            .update_password(tokens.user.id, Some("password1"), "password2", "password2")
            .await
            .unwrap();

        assert!(matches!(
            ctx.auth.sign_in("john@example.com", "password1").await,
            Err(AppError::Unauthorized { message }) if message == "You changed your password recently"
        ));
        assert!(matches!(
            ctx.auth.sign_in("john@example.com", "password9").await,
            Err(AppError::Unauthorized { message }) if message == "Invalid credentials"
        ));
        assert!(ctx.auth.sign_in("john@example.com", "password2").await.is_ok());
    }

    #[test]
    fn test_password_changed_message() {
        let now = 1_700_000_000;
        assert_eq!(
            password_changed_message(now - 60, now),
            "You changed your password recently"
        );
        assert_eq!(
            password_changed_message(now - HOUR, now),
            "You changed your password 1 hour ago"
        );
        assert_eq!(
            password_changed_message(now - 3 * DAY - 5, now),
            "You changed your password 3 days ago"
        );
        assert_eq!(
            password_changed_message(now - 2 * MONTH, now),
            "You changed your password 2 months ago"
        );
        assert_eq!(
            password_changed_message(now + 10, now),
            "You changed your password recently"
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejects_stale_version() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;

        let user = ctx.auth.authenticate(&tokens.access_token).await.unwrap();
        assert_eq!(user.id, tokens.user.id);
        assert!(ctx.auth.authenticate(&tokens.refresh_token).await.is_err());

        let updated = ctx
            .auth
            .update_password(user.id, Some("password1"), "password2", "password2")
            .await
            .unwrap();
        assert!(matches!(
            ctx.auth.authenticate(&tokens.access_token).await,
            Err(AppError::Unauthorized { message }) if message == "Invalid credentials"
        ));
        assert!(ctx.auth.authenticate(&updated.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let ctx = test_context().await;
        let tokens = confirmed_user(&ctx).await;
        let sent_before = ctx.mailer.sent().len();

        ctx.auth.forgot_password("nobody@example.com").await.unwrap();
        assert_eq!(ctx.mailer.sent().len(), sent_before);

        ctx.auth.forgot_password("john@example.com").await.unwrap();
        let reset = ctx.mailer.sent().pop().unwrap();
        assert!(reset.text.contains("/auth/reset-password?token="));
        let token = last_token(&ctx);

        assert!(matches!(
            ctx.auth.reset_password(&token, "password2", "password3").await,
            Err(AppError::BadRequest { .. })
        ));
        let user = ctx
            .auth
            .reset_password(&token, "password2", "password2")
            .await
            .unwrap();
        assert!(user.credentials.version > tokens.user.credentials.version);

        // Version moved on, so the same link cannot be reused
        assert!(ctx.auth.reset_password(&token, "password4", "password4").await.is_err());
        assert!(ctx.auth.sign_in("john@example.com", "password2").await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_password_ignores_unconfirmed() {
        let ctx = test_context().await;
        ctx.auth
            .sign_up("john@example.com", "John Doe", "password1", "password1")
            .await
            .unwrap();

        ctx.auth.forgot_password("john@example.com").await.unwrap();
        assert_eq!(ctx.mailer.sent().len(), 1);
    }
}
