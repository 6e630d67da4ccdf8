//! Storage seam for user accounts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{NewUser, OAuthProvider, User};
use crate::repositories::pagination::{Page, PageRequest};

/// Filters for the confirmed-user listing.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Case-insensitive substring of the display name
    pub search: Option<String>,
    pub page: PageRequest,
}

/// Keyset position of the user listing, ordered by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameCursor {
    pub username: String,
}

/// Persistence operations the account service relies on.
///
/// Uniqueness of email and username is enforced by the store itself;
/// violations surface as `AppError::Duplicate` with the offending field.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user and links `provider` atomically.
    async fn insert(&self, new_user: NewUser, provider: OAuthProvider) -> AppResult<User>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Number of usernames equal to `slug` or starting with it.
    async fn count_username_prefix(&self, slug: &str) -> AppResult<i64>;

    /// Persists every mutable column of `user` and refreshes `updated_at`.
    async fn save(&self, user: &User) -> AppResult<User>;

    /// Returns the number of deleted rows.
    async fn delete(&self, id: i32) -> AppResult<usize>;

    /// Links a provider; linking twice is a no-op.
    async fn link_provider(&self, user_id: i32, provider: OAuthProvider) -> AppResult<()>;

    async fn providers(&self, user_id: i32) -> AppResult<Vec<OAuthProvider>>;

    /// Confirmed users ordered by username.
    async fn query(&self, query: &UserQuery) -> AppResult<Page<User>>;
}
