use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::error::{AppError, AppResult};
use crate::models::OnlineStatus;
use crate::schema::users;

/// Password placeholder for accounts created through an OAuth provider.
///
/// Local sign-in stays disabled until a real password is set.
pub const UNSET_PASSWORD: &str = "UNSET";

/// Credentials versioning record embedded in every user row.
///
/// Every issued token carries `version`; bumping it invalidates all of them.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Credentials {
    #[diesel(column_name = credentials_version)]
    pub version: i32,
    #[diesel(column_name = credentials_last_password)]
    pub last_password: String,
    #[diesel(column_name = credentials_password_updated_at)]
    pub password_updated_at: i64,
    #[diesel(column_name = credentials_updated_at)]
    pub updated_at: i64,
}

impl Credentials {
    pub fn new(now: i64) -> Self {
        Self {
            version: 0,
            last_password: String::new(),
            password_updated_at: now,
            updated_at: now,
        }
    }

    fn bump(&mut self, now: i64) {
        self.version += 1;
        self.updated_at = now;
    }

    fn archive_password(&mut self, previous_hash: String, now: i64) {
        self.last_password = previous_hash;
        self.password_updated_at = now;
        self.bump(now);
    }
}

/// User model for reading from database
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub picture: Option<String>,
    pub confirmed: bool,
    pub online_status: OnlineStatus,
    pub default_status: OnlineStatus,
    #[diesel(embed)]
    pub credentials: Credentials,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A single mutation of a user record.
///
/// Every account operation is expressed as one of these and then persisted
/// with a whole-record save, so the set of mutable fields is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChange {
    /// Marks the email confirmed and bumps the credentials version.
    Confirm,
    /// Replaces the password hash, archiving the previous one.
    Password { hash: String },
    Email(String),
    Name(String),
    Username(String),
    Picture(Option<String>),
    OnlineStatus(OnlineStatus),
    DefaultStatus(OnlineStatus),
}

impl User {
    /// Whether the account was created by an OAuth provider and never got a password.
    pub fn is_oauth_only(&self) -> bool {
        self.password == UNSET_PASSWORD
    }

    /// Rejects tokens minted for a different credentials version.
    pub fn ensure_credentials_version(&self, version: i32) -> AppResult<()> {
        if self.credentials.version != version {
            return Err(AppError::Unauthorized {
                message: "Invalid credentials".to_string(),
            });
        }
        Ok(())
    }

    /// Applies a change in memory. `now` is a unix timestamp in seconds.
    pub fn apply(&mut self, change: UserChange, now: i64) {
        match change {
            UserChange::Confirm => {
                self.confirmed = true;
                self.credentials.bump(now);
            }
            UserChange::Password { hash } => {
                let previous = std::mem::replace(&mut self.password, hash);
                self.credentials.archive_password(previous, now);
            }
            UserChange::Email(email) => self.email = email,
            UserChange::Name(name) => self.name = name,
            UserChange::Username(username) => self.username = username,
            UserChange::Picture(picture) => self.picture = picture,
            UserChange::OnlineStatus(status) => self.online_status = status,
            UserChange::DefaultStatus(status) => self.default_status = status,
        }
    }
}

/// NewUser model for inserting new records
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub confirmed: bool,
    #[diesel(embed)]
    pub credentials: Credentials,
}

/// Full-row changeset written by `UserStore::save`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct UserChangeset<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub name: &'a str,
    pub password: &'a str,
    pub picture: Option<&'a str>,
    pub confirmed: bool,
    pub online_status: OnlineStatus,
    pub default_status: OnlineStatus,
    pub credentials_version: i32,
    pub credentials_last_password: &'a str,
    pub credentials_password_updated_at: i64,
    pub credentials_updated_at: i64,
}

impl<'a> From<&'a User> for UserChangeset<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: &user.email,
            username: &user.username,
            name: &user.name,
            password: &user.password,
            picture: user.picture.as_deref(),
            confirmed: user.confirmed,
            online_status: user.online_status,
            default_status: user.default_status,
            credentials_version: user.credentials.version,
            credentials_last_password: &user.credentials.last_password,
            credentials_password_updated_at: user.credentials.password_updated_at,
            credentials_updated_at: user.credentials.updated_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_user() -> User {
        let created = Timestamp::from(jiff::Timestamp::UNIX_EPOCH);
        User {
            id: 1,
            email: "john@example.com".to_string(),
            username: "john-doe".to_string(),
            name: "John Doe".to_string(),
            password: "hash-1".to_string(),
            picture: None,
            confirmed: false,
            online_status: OnlineStatus::Offline,
            default_status: OnlineStatus::Online,
            credentials: Credentials::new(0),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_confirm_bumps_version() {
        let mut user = sample_user();
        user.apply(UserChange::Confirm, 10);
        assert!(user.confirmed);
        assert_eq!(user.credentials.version, 1);
        assert_eq!(user.credentials.updated_at, 10);
    }

    #[test]
    fn test_password_change_archives_previous_hash() {
        let mut user = sample_user();
        user.apply(
            UserChange::Password {
                hash: "hash-2".to_string(),
            },
            42,
        );
        assert_eq!(user.password, "hash-2");
        assert_eq!(user.credentials.last_password, "hash-1");
        assert_eq!(user.credentials.password_updated_at, 42);
        assert_eq!(user.credentials.version, 1);
    }

    #[test]
    fn test_profile_changes_keep_version() {
        let mut user = sample_user();
        user.apply(UserChange::Name("Johnny".to_string()), 5);
        user.apply(UserChange::Username("johnny".to_string()), 5);
        user.apply(UserChange::Picture(Some("https://cdn/x.png".to_string())), 5);
        user.apply(UserChange::DefaultStatus(OnlineStatus::Busy), 5);
        assert_eq!(user.name, "Johnny");
        assert_eq!(user.username, "johnny");
        assert_eq!(user.picture.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(user.default_status, OnlineStatus::Busy);
        assert_eq!(user.credentials.version, 0);
    }

    #[test]
    fn test_ensure_credentials_version() {
        let mut user = sample_user();
        assert!(user.ensure_credentials_version(0).is_ok());
        user.apply(UserChange::Confirm, 1);
        let err = user.ensure_credentials_version(0).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { message } if message == "Invalid credentials"));
    }

    #[test]
    fn test_changeset_mirrors_user() {
        let mut user = sample_user();
        user.apply(UserChange::Picture(Some("p".to_string())), 1);
        let changeset = UserChangeset::from(&user);
        assert_eq!(changeset.email, user.email);
        assert_eq!(changeset.picture, Some("p"));
        assert_eq!(changeset.credentials_version, 0);
    }
}
