//! Refresh token entity.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::auth::reason::RevocationReason;
use crate::error::{DomainError, Result, Violations};
use crate::event::DomainEvent;
use crate::identity::ip::IpAddress;

/// Identity of a refresh token: the opaque token string itself.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(String);

impl RefreshTokenId {
    /// Converts a string into a [`RefreshTokenId`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string is blank.
    pub fn create(token: impl Into<String>) -> std::result::Result<Self, Violations> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DomainError::EmptyRefreshToken.into());
        }

        Ok(Self(token))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Token ids are bearer secrets; only a short prefix ever reaches logs.
impl fmt::Debug for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "RefreshTokenId({prefix}…)")
    }
}

impl AsRef<str> for RefreshTokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Terminal revocation state of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revocation {
    pub date: DateTime<Utc>,
    pub ip: IpAddress,
    pub reason: RevocationReason,
    /// Token that superseded this one, set only on rotation.
    pub replacing_token: Option<RefreshTokenId>,
}

/// A refresh token owned by a user.
///
/// Created active, revoked at most once. Expiry is derived from the
/// expiration date and never stored as a state.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    id: RefreshTokenId,
    expiration_date: DateTime<Utc>,
    created_date: DateTime<Utc>,
    created_by_ip: IpAddress,
    revocation: Option<Revocation>,
    events: Vec<DomainEvent>,
}

impl RefreshToken {
    /// Create a new active token and record one event per initialized field.
    pub fn create(
        id: RefreshTokenId,
        expiration_date: DateTime<Utc>,
        created_date: DateTime<Utc>,
        created_by_ip: IpAddress,
    ) -> Self {
        let events = vec![
            DomainEvent::RefreshTokenCreated {
                token_id: id.clone(),
            },
            DomainEvent::RefreshTokenExpirationDateChanged {
                token_id: id.clone(),
                date: expiration_date,
            },
            DomainEvent::RefreshTokenCreatedDateChanged {
                token_id: id.clone(),
                date: created_date,
            },
            DomainEvent::RefreshTokenCreatedByIpChanged {
                token_id: id.clone(),
                ip: created_by_ip.to_string(),
            },
        ];

        Self {
            id,
            expiration_date,
            created_date,
            created_by_ip,
            revocation: None,
            events,
        }
    }

    /// Rebuild a persisted token. Records no event.
    pub fn restore(
        id: RefreshTokenId,
        expiration_date: DateTime<Utc>,
        created_date: DateTime<Utc>,
        created_by_ip: IpAddress,
        revocation: Option<Revocation>,
    ) -> Self {
        Self {
            id,
            expiration_date,
            created_date,
            created_by_ip,
            revocation,
            events: Vec::new(),
        }
    }

    /// Revoke the token.
    ///
    /// Revoking an already revoked token is a no-op: nothing changes and no
    /// event is recorded.
    pub fn revoke(
        &mut self,
        at: DateTime<Utc>,
        ip: IpAddress,
        reason: RevocationReason,
        replacing_token: Option<RefreshTokenId>,
    ) -> Result<()> {
        if self.is_revoked() {
            return Ok(());
        }

        self.events.push(DomainEvent::RefreshTokenRevokedDateChanged {
            token_id: self.id.clone(),
            date: at,
        });
        self.events.push(DomainEvent::RefreshTokenRevokedByIpChanged {
            token_id: self.id.clone(),
            ip: ip.to_string(),
        });
        self.events.push(DomainEvent::RefreshTokenRevokeReasonChanged {
            token_id: self.id.clone(),
            reason: reason.to_string(),
        });
        if let Some(replacing) = &replacing_token {
            self.events
                .push(DomainEvent::RefreshTokenReplacingTokenChanged {
                    token_id: self.id.clone(),
                    replacing_token_id: replacing.clone(),
                });
        }

        self.revocation = Some(Revocation {
            date: at,
            ip,
            reason,
            replacing_token,
        });

        Ok(())
    }

    #[inline]
    pub fn id(&self) -> &RefreshTokenId {
        &self.id
    }

    #[inline]
    pub fn expiration_date(&self) -> DateTime<Utc> {
        self.expiration_date
    }

    #[inline]
    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    #[inline]
    pub fn created_by_ip(&self) -> &IpAddress {
        &self.created_by_ip
    }

    #[inline]
    pub fn revocation(&self) -> Option<&Revocation> {
        self.revocation.as_ref()
    }

    pub fn replacing_token(&self) -> Option<&RefreshTokenId> {
        self.revocation
            .as_ref()
            .and_then(|r| r.replacing_token.as_ref())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_date
    }

    pub fn is_revoked(&self) -> bool {
        self.revocation.is_some()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }

    /// Events recorded since the last commit.
    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl PartialEq for RefreshToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.expiration_date == other.expiration_date
            && self.created_date == other.created_date
            && self.created_by_ip == other.created_by_ip
            && self.revocation == other.revocation
    }
}

impl Eq for RefreshToken {}
