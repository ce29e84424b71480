//! Database models for PostgreSQL.

use application::error::{Result, ToInternal};
use chrono::{DateTime, Utc};
use domain::auth::password::UserPasswordHash;
use domain::auth::reason::RevocationReason;
use domain::auth::refresh_token::{RefreshToken, RefreshTokenId, Revocation};
use domain::external::vk::{VkInternalUserId, VkUser};
use domain::identity::date::{UserAuthorizationDate, UserRegistrationDate};
use domain::identity::email::UserEmail;
use domain::identity::ip::IpAddress;
use domain::identity::login::UserLogin;
use domain::identity::user::{User, UserSnapshot};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored row misses a column the domain requires.
#[derive(Debug, thiserror::Error)]
#[error("{table}.{column} is null for {id}")]
pub struct IncompleteRecord {
    table: &'static str,
    column: &'static str,
    id: String,
}

fn required<T>(
    value: Option<T>,
    table: &'static str,
    column: &'static str,
    id: impl ToString,
) -> Result<T> {
    value
        .ok_or_else(|| IncompleteRecord {
            table,
            column,
            id: id.to_string(),
        })
        .catch()
}

/// User row joined with its linked VK identity.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: Option<String>,
    pub login: Option<String>,
    pub password_hash: Option<String>,
    pub registration_date: Option<DateTime<Utc>>,
    pub authorization_date: Option<DateTime<Utc>>,
    pub vk_user_id: Option<Uuid>,
    pub vk_internal_id: Option<String>,
}

/// Refresh token row.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: String,
    pub user_id: Option<Uuid>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub created_by_ip: Option<String>,
    pub revoked_date: Option<DateTime<Utc>>,
    pub revoked_by_ip: Option<String>,
    pub revoke_reason: Option<String>,
    pub replacing_token_id: Option<String>,
}

impl RefreshTokenRecord {
    const TABLE: &'static str = "refresh_tokens";

    pub fn try_into_domain(self) -> Result<RefreshToken> {
        let expiration_date = required(
            self.expiration_date,
            Self::TABLE,
            "expiration_date",
            &self.id,
        )?;
        let created_date =
            required(self.created_date, Self::TABLE, "created_date", &self.id)?;
        let created_by_ip = self
            .created_by_ip
            .map(IpAddress::restore)
            .unwrap_or_default();

        let revocation = self.revoked_date.map(|date| Revocation {
            date,
            ip: self.revoked_by_ip.map(IpAddress::restore).unwrap_or_default(),
            reason: self
                .revoke_reason
                .as_deref()
                .map(RevocationReason::parse)
                .unwrap_or(RevocationReason::NotSpecified),
            replacing_token: self
                .replacing_token_id
                .and_then(|id| RefreshTokenId::create(id).ok()),
        });

        Ok(RefreshToken::restore(
            RefreshTokenId::create(self.id).catch()?,
            expiration_date,
            created_date,
            created_by_ip,
            revocation,
        ))
    }
}

impl UserRecord {
    const TABLE: &'static str = "users";

    /// Rebuild the aggregate from its row and its token rows.
    pub fn try_into_domain(
        self,
        tokens: Vec<RefreshTokenRecord>,
    ) -> Result<User> {
        let id = self.id;
        let email = required(self.email, Self::TABLE, "email", id)?;
        let registration_date = required(
            self.registration_date,
            Self::TABLE,
            "registration_date",
            id,
        )?;
        let authorization_date = required(
            self.authorization_date,
            Self::TABLE,
            "authorization_date",
            id,
        )?;

        let vk_user = match (self.vk_user_id, self.vk_internal_id) {
            (Some(vk_id), Some(internal_id)) => Some(VkUser::restore(
                vk_id.into(),
                VkInternalUserId::create(internal_id),
            )),
            _ => None,
        };

        let refresh_tokens = tokens
            .into_iter()
            .map(RefreshTokenRecord::try_into_domain)
            .collect::<Result<Vec<_>>>()?;

        Ok(User::restore(UserSnapshot {
            id: id.into(),
            email: UserEmail::create(email).catch()?,
            login: self.login.map(UserLogin::create).transpose().catch()?,
            password_hash: self
                .password_hash
                .map(UserPasswordHash::create)
                .transpose()
                .catch()?,
            registration_date: UserRegistrationDate::create(registration_date)
                .catch()?,
            authorization_date: UserAuthorizationDate::create(
                authorization_date,
            )
            .catch()?,
            vk_user,
            refresh_tokens,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn token_record() -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: "t0".into(),
            user_id: Some(Uuid::new_v4()),
            expiration_date: Some(t0() + chrono::Duration::hours(24)),
            created_date: Some(t0()),
            created_by_ip: Some("10.0.0.1".into()),
            revoked_date: None,
            revoked_by_ip: None,
            revoke_reason: None,
            replacing_token_id: None,
        }
    }

    #[test]
    fn test_active_token_record() {
        let token = token_record().try_into_domain().unwrap();

        assert_eq!(token.id().as_str(), "t0");
        assert_eq!(token.created_by_ip().as_str(), "10.0.0.1");
        assert!(!token.is_revoked());
    }

    #[test]
    fn test_revoked_token_record_keeps_revocation() {
        let record = RefreshTokenRecord {
            revoked_date: Some(t0()),
            revoked_by_ip: None,
            revoke_reason: Some("rotation".into()),
            replacing_token_id: Some("t1".into()),
            ..token_record()
        };

        let token = record.try_into_domain().unwrap();
        let revocation = token.revocation().unwrap();

        assert_eq!(revocation.reason, RevocationReason::Rotation);
        assert_eq!(revocation.ip.as_str(), "0.0.0.0");
        assert_eq!(
            token.replacing_token().map(RefreshTokenId::as_str),
            Some("t1")
        );
    }

    #[test]
    fn test_user_record_without_email_is_rejected() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: None,
            login: None,
            password_hash: None,
            registration_date: Some(t0()),
            authorization_date: Some(t0()),
            vk_user_id: None,
            vk_internal_id: None,
        };

        assert!(record.try_into_domain(Vec::new()).is_err());
    }
}
