//! In-memory implementations of the outbound ports, for use case tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain::auth::password::{Password, UserPasswordHash};
use domain::auth::refresh_token::RefreshTokenId;
use domain::event::DomainEvent;
use domain::external::vk::VkInternalUserId;
use domain::identity::email::UserEmail;
use domain::identity::id::UserId;
use domain::identity::ip::IpAddress;
use domain::identity::login::UserLogin;
use domain::identity::user::User;
use tokio_util::sync::CancellationToken;

use crate::error::{ApplicationError, Result};
use crate::ports::outbound::{
    Claims, Clock, CredentialIssuer, ExternalAccessToken, OAuthProvider,
    PasswordHasher, RefreshTokenMaterial, SUBJECT_CLAIM, TelemetryPort,
    UsersCommands, UsersQueries,
};

pub fn now() -> DateTime<Utc> {
    "2025-03-01T12:00:00Z".parse().unwrap()
}

/// Shared in-memory user store implementing both persistence ports.
#[derive(Clone, Default)]
pub struct InMemoryUsers {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUsers {
    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Result<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|user| predicate(user))
            .cloned()
            .ok_or(ApplicationError::UserNotFound)
    }

    fn any(&self, predicate: impl Fn(&User) -> bool) -> bool {
        self.users.lock().unwrap().values().any(predicate)
    }
}

#[async_trait]
impl UsersQueries for InMemoryUsers {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User> {
        self.find(|user| user.id() == *id)
    }

    async fn get_user_by_login(&self, login: &UserLogin) -> Result<User> {
        self.find(|user| user.login() == Some(login))
    }

    async fn get_user_by_email(&self, email: &UserEmail) -> Result<User> {
        self.find(|user| user.email() == email)
    }

    async fn get_user_by_refresh_token(
        &self,
        token: &RefreshTokenId,
    ) -> Result<User> {
        self.find(|user| user.refresh_token(token).is_some())
    }

    async fn get_user_by_vk_internal_id(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<User> {
        self.find(|user| {
            user.vk_user().map(|vk| vk.internal_id()) == Some(internal_id)
        })
    }

    async fn is_login_occupied(&self, login: &UserLogin) -> Result<bool> {
        Ok(self.any(|user| user.login() == Some(login)))
    }

    async fn is_email_occupied(&self, email: &UserEmail) -> Result<bool> {
        Ok(self.any(|user| user.email() == email))
    }

    async fn is_vk_user_exists(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<bool> {
        Ok(self.any(|user| {
            user.vk_user().map(|vk| vk.internal_id()) == Some(internal_id)
        }))
    }
}

#[async_trait]
impl UsersCommands for InMemoryUsers {
    async fn commit_changes(
        &self,
        user: &mut User,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        if cancellation.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }

        let mut users = self.users.lock().unwrap();

        // Same guard as the SQL adapter: a revocation only applies to a
        // token that is still unrevoked in storage.
        if let Some(stored) = users.get(&user.id()) {
            for event in user.pending_events() {
                if let DomainEvent::RefreshTokenRevokedDateChanged {
                    token_id,
                    ..
                } = event
                {
                    if stored
                        .refresh_token(token_id)
                        .is_some_and(|t| t.is_revoked())
                    {
                        return Err(ApplicationError::ConcurrentRevocation);
                    }
                }
            }
        }

        user.clear_events();
        users.insert(user.id(), user.clone());

        Ok(())
    }
}

/// Queries answering the first refresh token lookup with a snapshot taken
/// earlier, then reading the live store. Stands in for a request that loaded
/// the user just before another request committed.
pub struct StaleQueries {
    snapshot: Mutex<Option<User>>,
    users: InMemoryUsers,
}

impl StaleQueries {
    pub fn new(snapshot: User, users: InMemoryUsers) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            users,
        }
    }
}

#[async_trait]
impl UsersQueries for StaleQueries {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User> {
        self.users.get_user_by_id(id).await
    }

    async fn get_user_by_login(&self, login: &UserLogin) -> Result<User> {
        self.users.get_user_by_login(login).await
    }

    async fn get_user_by_email(&self, email: &UserEmail) -> Result<User> {
        self.users.get_user_by_email(email).await
    }

    async fn get_user_by_refresh_token(
        &self,
        token: &RefreshTokenId,
    ) -> Result<User> {
        let snapshot = self.snapshot.lock().unwrap().take();
        match snapshot {
            Some(user) => Ok(user),
            None => self.users.get_user_by_refresh_token(token).await,
        }
    }

    async fn get_user_by_vk_internal_id(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<User> {
        self.users.get_user_by_vk_internal_id(internal_id).await
    }

    async fn is_login_occupied(&self, login: &UserLogin) -> Result<bool> {
        self.users.is_login_occupied(login).await
    }

    async fn is_email_occupied(&self, email: &UserEmail) -> Result<bool> {
        self.users.is_email_occupied(email).await
    }

    async fn is_vk_user_exists(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<bool> {
        self.users.is_vk_user_exists(internal_id).await
    }
}

/// Clock frozen at a settable instant.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Issuer producing readable, predictable tokens.
#[derive(Clone, Default)]
pub struct FakeIssuer {
    counter: Arc<AtomicUsize>,
}

impl CredentialIssuer for FakeIssuer {
    fn generate_access_token(
        &self,
        _not_before: DateTime<Utc>,
        _expires: DateTime<Utc>,
        claims: &Claims,
    ) -> Result<String> {
        let subject = claims.get(SUBJECT_CLAIM).cloned().unwrap_or_default();
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("access.{subject}.{n}"))
    }

    fn validate_access_token(&self, token: &str) -> Claims {
        match token.split('.').collect::<Vec<_>>()[..] {
            ["access", subject, _] => {
                Claims::from([(SUBJECT_CLAIM.to_owned(), subject.to_owned())])
            },
            _ => Claims::new(),
        }
    }

    fn generate_refresh_token(
        &self,
        expires: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<RefreshTokenMaterial> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(RefreshTokenMaterial {
            token: format!("refresh-{n}"),
            expires,
            created: expires - Duration::hours(24),
            created_by_ip: IpAddress::parse_or_unspecified(ip),
        })
    }
}

/// Reversible "hash" for tests.
#[derive(Clone, Default)]
pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash(&self, password: &Password) -> Result<UserPasswordHash> {
        Ok(UserPasswordHash::create(format!("hashed:{}", password.as_str()))?)
    }

    fn verify(
        &self,
        password: &Password,
        hash: &UserPasswordHash,
    ) -> Result<bool> {
        Ok(hash.as_str() == format!("hashed:{}", password.as_str()))
    }
}

/// OAuth provider answering with a fixed response.
#[derive(Clone)]
pub struct FakeOAuth {
    pub response: std::result::Result<ExternalAccessToken, (String, String)>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeOAuth {
    pub fn returning(user_id: &str, email: Option<&str>) -> Self {
        Self {
            response: Ok(ExternalAccessToken {
                access_token: "vk-access".into(),
                expires_in: 86400,
                user_id: user_id.into(),
                email: email.map(Into::into),
            }),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: &str, description: &str) -> Self {
        Self {
            response: Err((error.into(), description.into())),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    async fn get_access_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        _redirect_uri: &str,
        _code: &str,
        _cancellation: &CancellationToken,
    ) -> Result<ExternalAccessToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(|(error, description)| {
            ApplicationError::OAuthProvider { error, description }
        })
    }
}

/// Telemetry keeping every recorded line.
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingTelemetry {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl TelemetryPort for RecordingTelemetry {
    fn record_auth_success(&self, user_id: &str, method: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("auth_success {user_id} {method}"));
    }

    fn record_auth_failure(&self, reason: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("auth_failure {reason}"));
    }

    fn record_account_created(&self, user_id: &str, method: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("account_created {user_id} {method}"));
    }

    fn record_token_reuse(&self, user_id: &str, revoked: usize) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("token_reuse {user_id} {revoked}"));
    }
}
