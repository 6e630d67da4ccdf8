//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the cache, storage and handlers.

mod auth_service;
pub mod mail;
mod oauth_service;
mod session_service;
mod user_service;

use std::sync::Arc;

pub use auth_service::{AuthService, AuthTokens};
pub use oauth_service::OAuthService;
pub use session_service::{SessionRecord, SessionService};
pub use user_service::UserService;

use crate::cache::CacheManager;
use crate::config::Settings;
use crate::external::oauth::OAuthClient;
use crate::external::storage::Uploader;
use crate::jobs::JobQueue;
use crate::repositories::UserStore;
use mail::{MailProvider, MailService};

/// External collaborators the services are wired to.
pub struct Backends {
    pub store: Arc<dyn UserStore>,
    pub cache: CacheManager,
    pub uploader: Arc<dyn Uploader>,
    pub oauth_client: Arc<dyn OAuthClient>,
    pub mailer: Arc<dyn MailProvider>,
    pub jobs: JobQueue,
}

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since every collaborator is behind an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub auth: AuthService,
    pub oauth: OAuthService,
    pub sessions: SessionService,
}

impl Services {
    pub fn new(settings: &Settings, backends: Backends) -> Self {
        let sessions = SessionService::new(backends.cache, &settings.auth);
        let mail = MailService::new(backends.mailer, &settings.mail, &settings.application);
        let users = UserService::new(
            backends.store,
            backends.uploader,
            backends.jobs,
            sessions.clone(),
            settings.storage.max_file_size,
        );
        let auth = AuthService::new(
            users.clone(),
            sessions.clone(),
            mail,
            settings.jwt.clone(),
        );
        let oauth = OAuthService::new(
            backends.oauth_client,
            settings.auth.oauth.clone(),
            users.clone(),
            sessions.clone(),
            auth.clone(),
        );

        Self {
            users,
            auth,
            oauth,
            sessions,
        }
    }
}
