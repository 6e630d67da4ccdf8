//! In-memory collaborators shared by unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cache::{CacheManager, MemoryCache};
use crate::config::{MemoryCacheConfig, OAuthClientConfig, OAuthSettings, Settings};
use crate::error::{AppError, AppResult};
use crate::external::oauth::{OAuthClient, OAuthProfile};
use crate::external::storage::{ImageKind, Uploader};
use crate::jobs::{JobQueue, QueuedJob};
use crate::models::{NewUser, OAuthProvider, OnlineStatus, User};
use crate::repositories::pagination::{Page, decode_cursor, encode_cursor};
use crate::repositories::{UserQuery, UserStore, UsernameCursor};
use crate::services::mail::{MailMessage, MailProvider};
use crate::services::{
    AuthService, Backends, OAuthService, Services, SessionService, UserService,
};

fn timestamp() -> jiff_diesel::Timestamp {
    jiff_diesel::Timestamp::from(jiff::Timestamp::now())
}

#[derive(Default)]
struct StoreState {
    next_id: i32,
    users: BTreeMap<i32, User>,
    links: Vec<(i32, OAuthProvider)>,
    next_prefix_count: Option<i64>,
    concurrent_insert: Option<(NewUser, OAuthProvider)>,
}

impl StoreState {
    fn store(&mut self, new_user: NewUser, provider: OAuthProvider) -> AppResult<User> {
        self.check_unique(0, &new_user.email, &new_user.username)?;

        self.next_id += 1;
        let user = User {
            id: self.next_id,
            email: new_user.email,
            username: new_user.username,
            name: new_user.name,
            password: new_user.password,
            picture: None,
            confirmed: new_user.confirmed,
            online_status: OnlineStatus::Offline,
            default_status: OnlineStatus::Online,
            credentials: new_user.credentials,
            created_at: timestamp(),
            updated_at: timestamp(),
        };
        self.users.insert(user.id, user.clone());
        self.links.push((user.id, provider));
        Ok(user)
    }

    fn check_unique(&self, id: i32, email: &str, username: &str) -> AppResult<()> {
        for other in self.users.values().filter(|u| u.id != id) {
            if other.email == email {
                return Err(AppError::duplicate("user", "email", email));
            }
            if other.username == username {
                return Err(AppError::duplicate("user", "username", username));
            }
        }
        Ok(())
    }
}

/// `UserStore` with the same uniqueness rules as the database.
#[derive(Default)]
pub(crate) struct InMemoryUserStore {
    state: Mutex<StoreState>,
}

impl InMemoryUserStore {
    /// Makes the next prefix count return `count`, as if it raced an insert.
    pub(crate) fn set_next_prefix_count(&self, count: i64) {
        self.state.lock().unwrap().next_prefix_count = Some(count);
    }

    /// Lands `new_user` right before the next insert, as a concurrent
    /// request would. Returns the id it will get.
    pub(crate) fn stage_concurrent_insert(&self, new_user: NewUser, provider: OAuthProvider) -> i32 {
        let mut state = self.state.lock().unwrap();
        state.concurrent_insert = Some((new_user, provider));
        state.next_id + 1
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: NewUser, provider: OAuthProvider) -> AppResult<User> {
        let mut state = self.state.lock().unwrap();
        if let Some((rival, rival_provider)) = state.concurrent_insert.take() {
            state.store(rival, rival_provider)?;
        }
        state.store(new_user, provider)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn count_username_prefix(&self, slug: &str) -> AppResult<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(count) = state.next_prefix_count.take() {
            return Ok(count);
        }
        Ok(state
            .users
            .values()
            .filter(|u| u.username.starts_with(slug))
            .count() as i64)
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&user.id) {
            return Err(AppError::not_found("user", "id", user.id));
        }
        state.check_unique(user.id, &user.email, &user.username)?;

        let mut saved = user.clone();
        saved.updated_at = timestamp();
        state.users.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: i32) -> AppResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.links.retain(|(user_id, _)| *user_id != id);
        Ok(usize::from(state.users.remove(&id).is_some()))
    }

    async fn link_provider(&self, user_id: i32, provider: OAuthProvider) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.links.contains(&(user_id, provider)) {
            state.links.push((user_id, provider));
        }
        Ok(())
    }

    async fn providers(&self, user_id: i32) -> AppResult<Vec<OAuthProvider>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, provider)| *provider)
            .collect())
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Page<User>> {
        let search = query.search.as_deref().map(str::to_lowercase);
        let mut listing: Vec<User> = {
            let state = self.state.lock().unwrap();
            state
                .users
                .values()
                .filter(|u| u.confirmed)
                .filter(|u| {
                    search
                        .as_deref()
                        .is_none_or(|s| u.name.to_lowercase().contains(s))
                })
                .cloned()
                .collect()
        };
        listing.sort_by(|a, b| a.username.cmp(&b.username));
        let total_count = listing.len() as i64;

        if let Some(after) = &query.page.after {
            let position: UsernameCursor = decode_cursor(after)?;
            listing.retain(|u| u.username > position.username);
        }
        listing.truncate(query.page.fetch_limit() as usize);

        Page::from_rows(listing, &query.page, total_count, |user: &User| {
            encode_cursor(&UsernameCursor {
                username: user.username.clone(),
            })
        })
    }
}

/// Uploader that records calls; deletes can be made to fail.
#[derive(Default)]
pub(crate) struct RecordingUploader {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    failing_deletes: AtomicUsize,
}

impl RecordingUploader {
    pub(crate) fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// The next `count` deletes fail.
    pub(crate) fn fail_deletes(&self, count: usize) {
        self.failing_deletes.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload_image(
        &self,
        user_id: i32,
        _image: Bytes,
        kind: ImageKind,
        _ratio: f64,
    ) -> AppResult<String> {
        let url = format!(
            "https://cdn.test/pictures/{}/{}.{}",
            user_id,
            Uuid::new_v4(),
            kind.extension()
        );
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete_file(&self, url: &str) -> AppResult<()> {
        let failing = self
            .failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(AppError::internal(anyhow::anyhow!("storage unavailable")));
        }
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub(crate) fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailProvider for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Accepts a single authorization code and returns a fixed profile.
pub(crate) struct FakeOAuthClient;

impl FakeOAuthClient {
    pub(crate) const CODE: &'static str = "valid-code";
}

#[async_trait]
impl OAuthClient for FakeOAuthClient {
    async fn fetch_profile(
        &self,
        _provider: OAuthProvider,
        _client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<OAuthProfile> {
        if code != Self::CODE {
            return Err(AppError::unauthorized("Invalid authorization code"));
        }
        Ok(OAuthProfile {
            email: "octo@example.com".to_string(),
            name: "Octo Cat".to_string(),
        })
    }
}

fn oauth_client(name: &str) -> OAuthClientConfig {
    OAuthClientConfig {
        client_id: format!("{name}-client"),
        client_secret: "secret".to_string(),
        redirect_url: format!("http://localhost:3000/api/auth/oauth/{name}/callback"),
        authorize_url: None,
        token_url: None,
        userinfo_url: None,
        scopes: Vec::new(),
    }
}

/// Settings used by service and router tests.
pub(crate) fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.jwt.secret = "test_secret_key_at_least_32_characters_long".to_string();
    settings.auth.oauth = OAuthSettings {
        github: Some(oauth_client("github")),
        google: Some(oauth_client("google")),
        ..Default::default()
    };
    settings
}

/// Fully wired services over in-memory collaborators.
pub(crate) struct TestContext {
    pub settings: Settings,
    pub store: Arc<InMemoryUserStore>,
    pub uploader: Arc<RecordingUploader>,
    pub mailer: Arc<RecordingMailer>,
    pub cache: CacheManager,
    pub services: Services,
    pub users: UserService,
    pub auth: AuthService,
    pub oauth: OAuthService,
    pub sessions: SessionService,
    jobs: tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>,
}

impl TestContext {
    /// Waits briefly for the next enqueued job.
    pub(crate) async fn next_job(&self) -> QueuedJob {
        let mut jobs = self.jobs.lock().await;
        tokio::time::timeout(Duration::from_secs(1), jobs.recv())
            .await
            .expect("timed out waiting for a job")
            .expect("job queue closed")
    }

    pub(crate) fn try_next_job(&self) -> Option<QueuedJob> {
        self.jobs.try_lock().ok()?.try_recv().ok()
    }
}

pub(crate) async fn test_context() -> TestContext {
    let settings = test_settings();
    let store = Arc::new(InMemoryUserStore::default());
    let uploader = Arc::new(RecordingUploader::default());
    let mailer = Arc::new(RecordingMailer::default());
    let cache = CacheManager::from_backend(Arc::new(MemoryCache::new(
        &MemoryCacheConfig::default(),
    )));
    let (jobs, receiver) = JobQueue::bounded(16);

    let services = Services::new(
        &settings,
        Backends {
            store: store.clone(),
            cache: cache.clone(),
            uploader: uploader.clone(),
            oauth_client: Arc::new(FakeOAuthClient),
            mailer: mailer.clone(),
            jobs,
        },
    );

    TestContext {
        settings,
        store,
        uploader,
        mailer,
        cache,
        users: services.users.clone(),
        auth: services.auth.clone(),
        oauth: services.oauth.clone(),
        sessions: services.sessions.clone(),
        services,
        jobs: tokio::sync::Mutex::new(receiver),
    }
}
