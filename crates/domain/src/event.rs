//! Domain events recorded by entities between two commits.
//!
//! Each variant describes one state change. Persistence adapters replay them
//! in order, one write per event, then clear them.

use chrono::{DateTime, Utc};

use crate::auth::refresh_token::RefreshTokenId;
use crate::external::vk::{VkInternalUserId, VkUserId};
use crate::identity::id::UserId;

/// A single change of state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    UserCreated {
        user_id: UserId,
    },
    UserPasswordHashChanged {
        user_id: UserId,
        password_hash: String,
    },
    UserEmailChanged {
        user_id: UserId,
        email: String,
    },
    UserRegistrationDateChanged {
        user_id: UserId,
        date: DateTime<Utc>,
    },
    UserAuthorizationDateChanged {
        user_id: UserId,
        date: DateTime<Utc>,
    },
    UserLoginChanged {
        user_id: UserId,
        login: String,
    },
    UserVkUserChanged {
        user_id: UserId,
        vk_user_id: VkUserId,
    },
    UserRefreshTokenAdded {
        user_id: UserId,
        token_id: RefreshTokenId,
    },
    /// Token rotation: `token_id` was revoked and replaced.
    UserRefreshTokenRevoked {
        user_id: UserId,
        token_id: RefreshTokenId,
        replacing_token_id: RefreshTokenId,
    },

    RefreshTokenCreated {
        token_id: RefreshTokenId,
    },
    RefreshTokenExpirationDateChanged {
        token_id: RefreshTokenId,
        date: DateTime<Utc>,
    },
    RefreshTokenCreatedDateChanged {
        token_id: RefreshTokenId,
        date: DateTime<Utc>,
    },
    RefreshTokenCreatedByIpChanged {
        token_id: RefreshTokenId,
        ip: String,
    },
    RefreshTokenRevokedDateChanged {
        token_id: RefreshTokenId,
        date: DateTime<Utc>,
    },
    RefreshTokenRevokedByIpChanged {
        token_id: RefreshTokenId,
        ip: String,
    },
    RefreshTokenRevokeReasonChanged {
        token_id: RefreshTokenId,
        reason: String,
    },
    RefreshTokenReplacingTokenChanged {
        token_id: RefreshTokenId,
        replacing_token_id: RefreshTokenId,
    },

    VkUserCreated {
        vk_user_id: VkUserId,
    },
    VkUserInternalIdChanged {
        vk_user_id: VkUserId,
        internal_id: VkInternalUserId,
    },
}

impl DomainEvent {
    /// Short stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserCreated { .. } => "user_created",
            Self::UserPasswordHashChanged { .. } => "user_password_hash_changed",
            Self::UserEmailChanged { .. } => "user_email_changed",
            Self::UserRegistrationDateChanged { .. } => {
                "user_registration_date_changed"
            },
            Self::UserAuthorizationDateChanged { .. } => {
                "user_authorization_date_changed"
            },
            Self::UserLoginChanged { .. } => "user_login_changed",
            Self::UserVkUserChanged { .. } => "user_vk_user_changed",
            Self::UserRefreshTokenAdded { .. } => "user_refresh_token_added",
            Self::UserRefreshTokenRevoked { .. } => {
                "user_refresh_token_revoked"
            },
            Self::RefreshTokenCreated { .. } => "refresh_token_created",
            Self::RefreshTokenExpirationDateChanged { .. } => {
                "refresh_token_expiration_date_changed"
            },
            Self::RefreshTokenCreatedDateChanged { .. } => {
                "refresh_token_created_date_changed"
            },
            Self::RefreshTokenCreatedByIpChanged { .. } => {
                "refresh_token_created_by_ip_changed"
            },
            Self::RefreshTokenRevokedDateChanged { .. } => {
                "refresh_token_revoked_date_changed"
            },
            Self::RefreshTokenRevokedByIpChanged { .. } => {
                "refresh_token_revoked_by_ip_changed"
            },
            Self::RefreshTokenRevokeReasonChanged { .. } => {
                "refresh_token_revoke_reason_changed"
            },
            Self::RefreshTokenReplacingTokenChanged { .. } => {
                "refresh_token_replacing_token_changed"
            },
            Self::VkUserCreated { .. } => "vk_user_created",
            Self::VkUserInternalIdChanged { .. } => {
                "vk_user_internal_id_changed"
            },
        }
    }
}
