//! Account service: creation, lookups and every profile or credentials
//! mutation of a user.
//!
//! Each mutation loads the user, checks the rule that guards it, applies a
//! single [`UserChange`] in memory and saves the whole record. Uniqueness of
//! email and username is enforced by the store's constraints; the lookups
//! done here first only exist to give a precise error in the common case.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{AppError, AppResult};
use crate::external::storage::{Uploader, validate_image};
use crate::jobs::JobQueue;
use crate::jobs::tasks::PictureCleanupTask;
use crate::models::{
    Credentials, NewUser, OAuthProvider, OnlineStatus, UNSET_PASSWORD, User, UserChange,
};
use crate::repositories::{Page, PageRequest, UserQuery, UserStore};
use crate::services::session_service::SessionService;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::slug::{slugify, username_candidate};

/// Inserts attempted before a username race is reported as a conflict.
const MAX_USERNAME_ATTEMPTS: u32 = 5;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const WRONG_PASSWORD: &str = "Wrong password";

fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}

/// User service for handling account business rules.
///
/// Cloning is cheap; every collaborator is shared.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    uploader: Arc<dyn Uploader>,
    jobs: JobQueue,
    sessions: SessionService,
    max_picture_size: usize,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        uploader: Arc<dyn Uploader>,
        jobs: JobQueue,
        sessions: SessionService,
        max_picture_size: usize,
    ) -> Self {
        Self {
            store,
            uploader,
            jobs,
            sessions,
            max_picture_size,
        }
    }

    /// Registers a new account.
    ///
    /// The username is the slug of `name`, suffixed with the number of
    /// usernames already sharing that prefix. Accounts without a password
    /// get the `UNSET` marker and are confirmed, since only OAuth creates them.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        provider: OAuthProvider,
        password: Option<&str>,
    ) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let name = name.trim().to_string();

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate("user", "email", email));
        }

        let password = match password {
            Some(password) => hash_password(password)?,
            None => UNSET_PASSWORD.to_string(),
        };

        let slug = slugify(&name);
        let mut suffix = self.store.count_username_prefix(&slug).await?;

        let mut username = username_candidate(&slug, suffix);
        for attempt in 1..=MAX_USERNAME_ATTEMPTS {
            let new_user = NewUser {
                email: email.clone(),
                username: username.clone(),
                name: name.clone(),
                password: password.clone(),
                confirmed: provider != OAuthProvider::Local,
                credentials: Credentials::new(now()),
            };

            match self.store.insert(new_user, provider).await {
                Err(e) if e.is_duplicate_of("username") && attempt < MAX_USERNAME_ATTEMPTS => {
                    tracing::debug!(username = %username, attempt, "Username taken, retrying");
                    suffix += 1;
                    username = username_candidate(&slug, suffix);
                }
                Ok(user) => {
                    tracing::info!(user_id = user.id, username = %user.username, provider = %provider, "User created");
                    return Ok(user);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::duplicate("user", "username", username))
    }

    pub async fn find_one_by_id(&self, id: i32) -> AppResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", id))
    }

    pub async fn find_one_by_username(&self, username: &str) -> AppResult<User> {
        let username = username.trim().to_lowercase();
        self.store
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::not_found("user", "username", username))
    }

    pub async fn find_one_by_email(&self, email: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        self.store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("user", "email", email))
    }

    /// Like [`Self::find_one_by_id`] but absence is reported as bad credentials.
    pub async fn find_one_by_id_for_auth(&self, id: i32) -> AppResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))
    }

    pub async fn find_one_by_email_for_auth(&self, email: &str) -> AppResult<User> {
        self.store
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))
    }

    pub async fn find_one_by_username_for_auth(&self, username: &str) -> AppResult<User> {
        self.store
            .find_by_username(&username.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))
    }

    /// Loads the user a token was issued for, rejecting stale versions.
    pub async fn find_one_by_credentials(&self, id: i32, version: i32) -> AppResult<User> {
        let user = self.find_one_by_id_for_auth(id).await?;
        user.ensure_credentials_version(version)?;
        Ok(user)
    }

    pub async fn confirm_email(&self, id: i32, version: i32) -> AppResult<User> {
        let user = self.find_one_by_credentials(id, version).await?;
        if user.confirmed {
            return Err(AppError::bad_request("Email already confirmed"));
        }
        self.apply(user, UserChange::Confirm).await
    }

    /// Changes the password after checking the current one.
    ///
    /// Accounts created through OAuth have no password yet and may set one
    /// without `old_password`.
    pub async fn update_password(
        &self,
        id: i32,
        old_password: Option<&str>,
        new_password: &str,
    ) -> AppResult<User> {
        let user = self.find_one_by_id(id).await?;

        if !user.is_oauth_only() {
            let old_matches = old_password.is_some_and(|old| verify_password(old, &user.password));
            if !old_matches {
                return Err(AppError::bad_request(WRONG_PASSWORD));
            }
            if verify_password(new_password, &user.password) {
                return Err(AppError::bad_request("New password must be different"));
            }
        }

        let hash = hash_password(new_password)?;
        self.apply(user, UserChange::Password { hash }).await
    }

    /// Sets a new password from a forgot-password token.
    pub async fn reset_password(&self, id: i32, version: i32, new_password: &str) -> AppResult<User> {
        let user = self.find_one_by_credentials(id, version).await?;
        let hash = hash_password(new_password)?;
        self.apply(user, UserChange::Password { hash }).await
    }

    pub async fn update_email(&self, id: i32, email: &str, password: &str) -> AppResult<User> {
        let user = self.find_one_by_id(id).await?;
        if !verify_password(password, &user.password) {
            return Err(AppError::bad_request(WRONG_PASSWORD));
        }

        let email = email.trim().to_lowercase();
        if email == user.email {
            return Err(AppError::bad_request("Email should be different"));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate("user", "email", email));
        }

        self.apply(user, UserChange::Email(email)).await
    }

    /// Deletes the account. The stored picture, if any, is queued for removal.
    pub async fn delete(&self, id: i32, password: &str) -> AppResult<User> {
        let user = self.find_one_by_id(id).await?;
        if !verify_password(password, &user.password) {
            return Err(AppError::bad_request(WRONG_PASSWORD));
        }

        if self.store.delete(id).await? == 0 {
            return Err(AppError::not_found("user", "id", id));
        }
        if let Some(picture) = &user.picture {
            self.jobs.enqueue(&PictureCleanupTask::new(picture.as_str()));
        }
        if let Err(e) = self.sessions.end(id).await {
            tracing::warn!(user_id = id, error = %e, "Failed to clear session of deleted user");
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(user)
    }

    /// Stores a new picture and queues removal of the one it replaces.
    pub async fn update_picture(&self, id: i32, image: Bytes, ratio: f64) -> AppResult<User> {
        let kind = validate_image(&image, ratio, self.max_picture_size)?;
        let user = self.find_one_by_id(id).await?;
        let previous = user.picture.clone();

        let url = self.uploader.upload_image(id, image, kind, ratio).await?;
        let saved = match self.apply(user, UserChange::Picture(Some(url.clone()))).await {
            Ok(saved) => saved,
            Err(e) => {
                self.jobs.enqueue(&PictureCleanupTask::new(url));
                return Err(e);
            }
        };

        if let Some(previous) = previous {
            self.jobs.enqueue(&PictureCleanupTask::new(previous));
        }
        Ok(saved)
    }

    pub async fn update_name(&self, id: i32, name: &str) -> AppResult<User> {
        let user = self.find_one_by_id(id).await?;
        let name = name.trim();
        if name == user.name {
            return Err(AppError::bad_request("Name should be different"));
        }
        self.apply(user, UserChange::Name(name.to_string())).await
    }

    pub async fn update_username(&self, id: i32, username: &str) -> AppResult<User> {
        let user = self.find_one_by_id(id).await?;
        let username = username.trim().to_lowercase();
        if username == user.username {
            return Err(AppError::bad_request("Username should be different"));
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(AppError::duplicate("user", "username", username));
        }
        self.apply(user, UserChange::Username(username)).await
    }

    /// Updates presence settings.
    ///
    /// `default_status` is always applied. `online_status` is only applied
    /// while the user has an active session, so an offline user cannot be
    /// shown as online.
    pub async fn update_online_status(
        &self,
        id: i32,
        online_status: Option<OnlineStatus>,
        default_status: Option<OnlineStatus>,
    ) -> AppResult<User> {
        let mut user = self.find_one_by_id(id).await?;
        let now = now();

        if let Some(status) = default_status {
            user.apply(UserChange::DefaultStatus(status), now);
        }
        if let Some(status) = online_status {
            if self.sessions.is_active(id).await? {
                user.apply(UserChange::OnlineStatus(status), now);
            } else {
                tracing::debug!(user_id = id, "No active session, online status unchanged");
            }
        }

        self.store.save(&user).await
    }

    /// Confirmed users ordered by username, optionally filtered by name.
    pub async fn query(
        &self,
        search: Option<&str>,
        first: Option<i64>,
        after: Option<String>,
    ) -> AppResult<Page<User>> {
        let query = UserQuery {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            page: PageRequest::new(first, after)?,
        };
        self.store.query(&query).await
    }

    /// Account for an OAuth login: links the provider to an existing account
    /// with the same email, or creates a new one.
    pub async fn find_or_create(
        &self,
        provider: OAuthProvider,
        email: &str,
        name: &str,
    ) -> AppResult<User> {
        let email = email.trim().to_lowercase();

        if let Some(user) = self.store.find_by_email(&email).await? {
            self.store.link_provider(user.id, provider).await?;
            return Ok(user);
        }

        match self.create(&email, name, provider, None).await {
            // Lost a race against a concurrent login with the same email
            Err(e) if e.is_duplicate_of("email") => {
                let user = self.find_one_by_email(&email).await?;
                self.store.link_provider(user.id, provider).await?;
                Ok(user)
            }
            other => other,
        }
    }

    pub async fn providers(&self, id: i32) -> AppResult<Vec<OAuthProvider>> {
        self.store.providers(id).await
    }

    async fn apply(&self, mut user: User, change: UserChange) -> AppResult<User> {
        user.apply(change, now());
        self.store.save(&user).await
    }
}
