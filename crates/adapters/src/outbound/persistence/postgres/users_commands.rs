//! PostgreSQL implementation of the user write side.
//!
//! A commit replays the pending events of the aggregate inside a single
//! transaction, one statement per event. Foreign keys are deferred, so the
//! order of token events relative to each other does not matter.

use application::error::{ApplicationError, Result, ToInternal};
use application::ports::outbound::UsersCommands;
use async_trait::async_trait;
use domain::error::DomainError;
use domain::event::DomainEvent;
use domain::identity::id::UserId;
use domain::identity::user::User;
use sqlx::{PgConnection, PgPool};
use tokio_util::sync::CancellationToken;

/// PostgreSQL user commands.
pub struct PgUsersCommands {
    pool: PgPool,
}

impl PgUsersCommands {
    /// Create a new [`PgUsersCommands`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turn a unique violation on login or email into the matching conflict.
fn map_write_error(err: sqlx::Error, event: &DomainEvent) -> ApplicationError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    match event {
        DomainEvent::UserLoginChanged { login, .. } if unique => {
            DomainError::LoginIsOccupied {
                login: login.clone(),
            }
            .into()
        },
        DomainEvent::UserEmailChanged { email, .. } if unique => {
            DomainError::EmailIsOccupied {
                email: email.clone(),
            }
            .into()
        },
        _ => ApplicationError::internal(err),
    }
}

/// Write one event.
async fn apply(
    conn: &mut PgConnection,
    owner: &UserId,
    event: &DomainEvent,
) -> Result<()> {
    let query = match event {
        DomainEvent::UserCreated { user_id } => {
            sqlx::query("INSERT INTO users (id) VALUES ($1)")
                .bind(user_id.as_uuid())
        },
        DomainEvent::UserPasswordHashChanged {
            user_id,
            password_hash,
        } => sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(password_hash),
        DomainEvent::UserEmailChanged { user_id, email } => {
            sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
                .bind(user_id.as_uuid())
                .bind(email)
        },
        DomainEvent::UserRegistrationDateChanged { user_id, date } => {
            sqlx::query("UPDATE users SET registration_date = $2 WHERE id = $1")
                .bind(user_id.as_uuid())
                .bind(date)
        },
        DomainEvent::UserAuthorizationDateChanged { user_id, date } => {
            sqlx::query(
                "UPDATE users SET authorization_date = $2 WHERE id = $1",
            )
            .bind(user_id.as_uuid())
            .bind(date)
        },
        DomainEvent::UserLoginChanged { user_id, login } => {
            sqlx::query("UPDATE users SET login = $2 WHERE id = $1")
                .bind(user_id.as_uuid())
                .bind(login)
        },
        DomainEvent::UserVkUserChanged {
            user_id,
            vk_user_id,
        } => sqlx::query("UPDATE users SET vk_user_id = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(vk_user_id.as_uuid()),
        // Ownership is written by the token insert.
        DomainEvent::UserRefreshTokenAdded { .. }
        | DomainEvent::UserRefreshTokenRevoked { .. } => return Ok(()),

        DomainEvent::RefreshTokenCreated { token_id } => sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id) VALUES ($1, $2)",
        )
        .bind(token_id.as_str())
        .bind(owner.as_uuid()),
        DomainEvent::RefreshTokenExpirationDateChanged { token_id, date } => {
            sqlx::query(
                "UPDATE refresh_tokens SET expiration_date = $2 WHERE id = $1",
            )
            .bind(token_id.as_str())
            .bind(date)
        },
        DomainEvent::RefreshTokenCreatedDateChanged { token_id, date } => {
            sqlx::query(
                "UPDATE refresh_tokens SET created_date = $2 WHERE id = $1",
            )
            .bind(token_id.as_str())
            .bind(date)
        },
        DomainEvent::RefreshTokenCreatedByIpChanged { token_id, ip } => {
            sqlx::query(
                "UPDATE refresh_tokens SET created_by_ip = $2 WHERE id = $1",
            )
            .bind(token_id.as_str())
            .bind(ip)
        },
        DomainEvent::RefreshTokenRevokedDateChanged { token_id, date } => {
            // Only the first revocation wins. A concurrent request that
            // revoked the token since it was loaded leaves nothing to update.
            let result = sqlx::query(
                r#"
                UPDATE refresh_tokens
                SET revoked_date = $2
                WHERE id = $1 AND revoked_date IS NULL
                "#,
            )
            .bind(token_id.as_str())
            .bind(date)
            .execute(&mut *conn)
            .await
            .catch()?;

            if result.rows_affected() == 0 {
                return Err(ApplicationError::ConcurrentRevocation);
            }
            return Ok(());
        },
        DomainEvent::RefreshTokenRevokedByIpChanged { token_id, ip } => {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_by_ip = $2 WHERE id = $1",
            )
            .bind(token_id.as_str())
            .bind(ip)
        },
        DomainEvent::RefreshTokenRevokeReasonChanged { token_id, reason } => {
            sqlx::query(
                "UPDATE refresh_tokens SET revoke_reason = $2 WHERE id = $1",
            )
            .bind(token_id.as_str())
            .bind(reason)
        },
        DomainEvent::RefreshTokenReplacingTokenChanged {
            token_id,
            replacing_token_id,
        } => sqlx::query(
            "UPDATE refresh_tokens SET replacing_token_id = $2 WHERE id = $1",
        )
        .bind(token_id.as_str())
        .bind(replacing_token_id.as_str()),

        DomainEvent::VkUserCreated { vk_user_id } => {
            sqlx::query("INSERT INTO vk_users (id) VALUES ($1)")
                .bind(vk_user_id.as_uuid())
        },
        DomainEvent::VkUserInternalIdChanged {
            vk_user_id,
            internal_id,
        } => sqlx::query("UPDATE vk_users SET internal_id = $2 WHERE id = $1")
            .bind(vk_user_id.as_uuid())
            .bind(internal_id.as_str()),
    };

    query
        .execute(conn)
        .await
        .map_err(|err| map_write_error(err, event))?;

    Ok(())
}

#[async_trait]
impl UsersCommands for PgUsersCommands {
    #[tracing::instrument(skip_all, fields(user_id = %user.id()))]
    async fn commit_changes(
        &self,
        user: &mut User,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let events = user.pending_events();
        if events.is_empty() {
            return Ok(());
        }

        let owner = user.id();
        let mut tx = self.pool.begin().await.catch()?;

        for event in &events {
            if cancellation.is_cancelled() {
                tracing::debug!(event = event.name(), "commit cancelled");
                return Err(ApplicationError::Cancelled);
            }
            apply(&mut tx, &owner, event).await?;
        }

        if cancellation.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }
        // Deferred foreign keys are checked here.
        tx.commit().await.catch()?;

        tracing::debug!(events = events.len(), "user changes committed");
        user.clear_events();

        Ok(())
    }
}
