//! User repository for async database operations.
//!
//! Implements [`UserStore`] on top of diesel_async.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, NewUserOAuthProvider, OAuthProvider, User, UserChangeset};
use crate::repositories::pagination::{Page, decode_cursor, encode_cursor};
use crate::repositories::user_store::{UserQuery, UserStore, UsernameCursor};
use crate::schema::{user_oauth_providers, users};

/// User repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap
/// (just reference count increment). No need for `Arc<UserRepository>`.
#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Confirmed users, optionally filtered by name.
    fn listing(search: Option<&str>) -> users::BoxedQuery<'static, Pg> {
        let mut query = users::table
            .filter(users::confirmed.eq(true))
            .into_boxed();
        if let Some(search) = search {
            query = query.filter(users::name.ilike(format!("%{}%", escape_like(search))));
        }
        query
    }
}

/// Escapes LIKE wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, new_user: NewUser, provider: OAuthProvider) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<User, AppError, _>(|conn| {
            async move {
                let user = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::insert_into(user_oauth_providers::table)
                    .values(&NewUserOAuthProvider {
                        user_id: user.id,
                        provider,
                    })
                    .execute(conn)
                    .await?;

                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_email(&self, user_email: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::email.eq(user_email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_username(&self, user_username: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(user_username))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn count_username_prefix(&self, slug: &str) -> AppResult<i64> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.like(format!("{}%", escape_like(slug))))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::update(users::table.filter(users::id.eq(user.id)))
            .set((
                UserChangeset::from(user),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| AppError::not_found("user", "id", user.id))
    }

    async fn delete(&self, user_id: i32) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::delete(users::table.filter(users::id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn link_provider(&self, user_id: i32, provider: OAuthProvider) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(user_oauth_providers::table)
            .values(&NewUserOAuthProvider { user_id, provider })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn providers(&self, user_id: i32) -> AppResult<Vec<OAuthProvider>> {
        let mut conn = self.pool.get().await?;

        user_oauth_providers::table
            .filter(user_oauth_providers::user_id.eq(user_id))
            .order(user_oauth_providers::created_at.asc())
            .select(user_oauth_providers::provider)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Page<User>> {
        let search = query.search.as_deref();
        let mut conn = self.pool.get().await?;

        let total_count: i64 = Self::listing(search)
            .count()
            .get_result(&mut conn)
            .await?;

        let mut rows = Self::listing(search);
        if let Some(after) = &query.page.after {
            let position: UsernameCursor = decode_cursor(after)?;
            rows = rows.filter(users::username.gt(position.username));
        }

        let rows = rows
            .order(users::username.asc())
            .limit(query.page.fetch_limit())
            .select(User::as_select())
            .load(&mut conn)
            .await?;

        Page::from_rows(rows, &query.page, total_count, |user: &User| {
            encode_cursor(&UsernameCursor {
                username: user.username.clone(),
            })
        })
    }
}
