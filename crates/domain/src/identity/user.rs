//! User aggregate.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::auth::password::UserPasswordHash;
use crate::auth::reason::RevocationReason;
use crate::auth::refresh_token::{RefreshToken, RefreshTokenId};
use crate::error::{DomainError, Result};
use crate::event::DomainEvent;
use crate::external::vk::VkUser;
use crate::identity::date::{UserAuthorizationDate, UserRegistrationDate};
use crate::identity::email::UserEmail;
use crate::identity::id::UserId;
use crate::identity::ip::IpAddress;
use crate::identity::login::UserLogin;

/// Persisted state used to rebuild a [`User`] without recording events.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub id: UserId,
    pub email: UserEmail,
    pub login: Option<UserLogin>,
    pub password_hash: Option<UserPasswordHash>,
    pub registration_date: UserRegistrationDate,
    pub authorization_date: UserAuthorizationDate,
    pub vk_user: Option<VkUser>,
    pub refresh_tokens: Vec<RefreshToken>,
}

/// Aggregate root owning the refresh tokens and the optional VK identity of
/// one account.
///
/// Every change goes through a method that records the matching
/// [`DomainEvent`].
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: UserEmail,
    login: Option<UserLogin>,
    password_hash: Option<UserPasswordHash>,
    registration_date: UserRegistrationDate,
    authorization_date: UserAuthorizationDate,
    vk_user: Option<VkUser>,
    refresh_tokens: HashMap<RefreshTokenId, RefreshToken>,
    events: Vec<DomainEvent>,
}

impl User {
    /// Create a new user with a fresh [`UserId`].
    ///
    /// Records the creation, then one event per present field.
    pub fn create(
        password_hash: Option<UserPasswordHash>,
        email: UserEmail,
        registration_date: UserRegistrationDate,
        authorization_date: UserAuthorizationDate,
        login: Option<UserLogin>,
    ) -> Result<Self> {
        let id = UserId::new();
        let mut events = vec![DomainEvent::UserCreated { user_id: id }];

        if let Some(hash) = &password_hash {
            events.push(DomainEvent::UserPasswordHashChanged {
                user_id: id,
                password_hash: hash.as_str().to_owned(),
            });
        }
        events.push(DomainEvent::UserEmailChanged {
            user_id: id,
            email: email.as_str().to_owned(),
        });
        events.push(DomainEvent::UserRegistrationDateChanged {
            user_id: id,
            date: registration_date.value(),
        });
        events.push(DomainEvent::UserAuthorizationDateChanged {
            user_id: id,
            date: authorization_date.value(),
        });
        if let Some(login) = &login {
            events.push(DomainEvent::UserLoginChanged {
                user_id: id,
                login: login.as_str().to_owned(),
            });
        }

        Ok(Self {
            id,
            email,
            login,
            password_hash,
            registration_date,
            authorization_date,
            vk_user: None,
            refresh_tokens: HashMap::new(),
            events,
        })
    }

    /// Rebuild a persisted user. Records no event.
    pub fn restore(snapshot: UserSnapshot) -> Self {
        let refresh_tokens = snapshot
            .refresh_tokens
            .into_iter()
            .map(|token| (token.id().clone(), token))
            .collect();

        Self {
            id: snapshot.id,
            email: snapshot.email,
            login: snapshot.login,
            password_hash: snapshot.password_hash,
            registration_date: snapshot.registration_date,
            authorization_date: snapshot.authorization_date,
            vk_user: snapshot.vk_user,
            refresh_tokens,
            events: Vec::new(),
        }
    }

    /// Link a VK account. Write-once.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ExternalIdentityAlreadyLinked`] if a VK account
    /// is already linked.
    pub fn attach_external_identity(&mut self, vk_user: VkUser) -> Result<()> {
        if self.vk_user.is_some() {
            return Err(DomainError::ExternalIdentityAlreadyLinked);
        }

        self.events.push(DomainEvent::UserVkUserChanged {
            user_id: self.id,
            vk_user_id: vk_user.id(),
        });
        self.vk_user = Some(vk_user);

        Ok(())
    }

    /// Take ownership of a refresh token. Adding a token whose id is already
    /// owned changes nothing.
    pub fn add_refresh_token(&mut self, token: RefreshToken) -> Result<()> {
        if self.refresh_tokens.contains_key(token.id()) {
            return Ok(());
        }

        self.events.push(DomainEvent::UserRefreshTokenAdded {
            user_id: self.id,
            token_id: token.id().clone(),
        });
        self.refresh_tokens.insert(token.id().clone(), token);

        Ok(())
    }

    /// Move the last sign-in date.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidAuthorizationDate`] if `date` is older
    /// than the current one and `force` is not set.
    pub fn update_authorization_date(
        &mut self,
        date: UserAuthorizationDate,
        force: bool,
    ) -> Result<()> {
        if !force && date < self.authorization_date {
            return Err(DomainError::InvalidAuthorizationDate);
        }

        self.events.push(DomainEvent::UserAuthorizationDateChanged {
            user_id: self.id,
            date: date.value(),
        });
        self.authorization_date = date;

        Ok(())
    }

    /// Revoke an owned token, optionally replacing it.
    ///
    /// With a replacement, the new token is added to the user and linked from
    /// the revoked one. If `target` was already revoked nothing happens, the
    /// replacement included.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::RevokingTokenNotFound`] if `target` is not owned
    /// by this user.
    pub fn revoke_token(
        &mut self,
        target: &RefreshTokenId,
        at: DateTime<Utc>,
        ip: IpAddress,
        reason: RevocationReason,
        replacing_token: Option<RefreshToken>,
    ) -> Result<()> {
        let token = self
            .refresh_tokens
            .get_mut(target)
            .ok_or(DomainError::RevokingTokenNotFound)?;

        if token.is_revoked() {
            return Ok(());
        }

        let replacing_id = replacing_token.as_ref().map(|t| t.id().clone());
        token.revoke(at, ip, reason, replacing_id.clone())?;

        if let (Some(replacing), Some(replacing_id)) =
            (replacing_token, replacing_id)
        {
            self.add_refresh_token(replacing)?;
            self.events.push(DomainEvent::UserRefreshTokenRevoked {
                user_id: self.id,
                token_id: target.clone(),
                replacing_token_id: replacing_id,
            });
        }

        Ok(())
    }

    /// Revoke every still active token reachable from `start` through
    /// replacement links.
    ///
    /// Used when an already revoked token is presented again: its successors
    /// may be in the hands of an attacker. Each token is visited at most once,
    /// so corrupted links forming a cycle cannot loop. Returns the ids revoked
    /// by this call, in chain order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::RevokingTokenNotFound`] if `start` is not owned
    /// by this user.
    pub fn revoke_descendants(
        &mut self,
        start: &RefreshTokenId,
        at: DateTime<Utc>,
        ip: &IpAddress,
        reason: &RevocationReason,
    ) -> Result<Vec<RefreshTokenId>> {
        let mut next = self
            .refresh_tokens
            .get(start)
            .ok_or(DomainError::RevokingTokenNotFound)?
            .replacing_token()
            .cloned();

        let mut visited = HashSet::from([start.clone()]);
        let mut revoked = Vec::new();

        while let Some(id) = next.take() {
            if !visited.insert(id.clone()) {
                break;
            }
            let Some(token) = self.refresh_tokens.get_mut(&id) else {
                break;
            };

            if token.is_active(at) {
                token.revoke(at, ip.clone(), reason.clone(), None)?;
                revoked.push(id);
            } else {
                next = token.replacing_token().cloned();
            }
        }

        Ok(revoked)
    }

    #[inline]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[inline]
    pub fn email(&self) -> &UserEmail {
        &self.email
    }

    #[inline]
    pub fn login(&self) -> Option<&UserLogin> {
        self.login.as_ref()
    }

    #[inline]
    pub fn password_hash(&self) -> Option<&UserPasswordHash> {
        self.password_hash.as_ref()
    }

    #[inline]
    pub fn registration_date(&self) -> UserRegistrationDate {
        self.registration_date
    }

    #[inline]
    pub fn authorization_date(&self) -> UserAuthorizationDate {
        self.authorization_date
    }

    #[inline]
    pub fn vk_user(&self) -> Option<&VkUser> {
        self.vk_user.as_ref()
    }

    pub fn refresh_token(&self, id: &RefreshTokenId) -> Option<&RefreshToken> {
        self.refresh_tokens.get(id)
    }

    pub fn refresh_tokens(&self) -> impl Iterator<Item = &RefreshToken> {
        self.refresh_tokens.values()
    }

    /// Events recorded since the last commit, the VK identity's first, then
    /// the user's, then each token's.
    pub fn pending_events(&self) -> Vec<&DomainEvent> {
        let vk = self
            .vk_user
            .iter()
            .flat_map(|vk| vk.pending_events().iter());
        let tokens = self
            .refresh_tokens
            .values()
            .flat_map(|token| token.pending_events().iter());

        vk.chain(self.events.iter()).chain(tokens).collect()
    }

    /// Drop every recorded event, once they have been persisted.
    pub fn clear_events(&mut self) {
        self.events.clear();
        if let Some(vk) = self.vk_user.as_mut() {
            vk.clear_events();
        }
        self.refresh_tokens
            .values_mut()
            .for_each(RefreshToken::clear_events);
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.login == other.login
            && self.password_hash == other.password_hash
            && self.registration_date == other.registration_date
            && self.authorization_date == other.authorization_date
            && self.vk_user == other.vk_user
            && self.refresh_tokens == other.refresh_tokens
    }
}

impl Eq for User {}
