//! PostgreSQL implementation of the user read side.

use application::error::{ApplicationError, Result, ToInternal};
use application::ports::outbound::UsersQueries;
use async_trait::async_trait;
use domain::auth::refresh_token::RefreshTokenId;
use domain::external::vk::VkInternalUserId;
use domain::identity::email::UserEmail;
use domain::identity::id::UserId;
use domain::identity::login::UserLogin;
use domain::identity::user::User;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{RefreshTokenRecord, UserRecord};

/// PostgreSQL user queries.
pub struct PgUsersQueries {
    pool: PgPool,
}

impl PgUsersQueries {
    /// Create a new [`PgUsersQueries`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a user id with a query returning at most one `id`.
    async fn find_id(&self, sql: &str, key: &str) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .catch()?
            .ok_or(ApplicationError::UserNotFound)
    }

    async fn exists(&self, sql: &str, key: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .catch()
    }

    /// Load the whole aggregate: user row, VK identity and every token.
    async fn load(&self, id: Uuid) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT
                u.id, u.email, u.login, u.password_hash,
                u.registration_date, u.authorization_date,
                u.vk_user_id, v.internal_id AS vk_internal_id
            FROM users u
            LEFT JOIN vk_users v ON v.id = u.vk_user_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .catch()?
        .ok_or(ApplicationError::UserNotFound)?;

        let tokens = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT
                id, user_id, expiration_date, created_date, created_by_ip,
                revoked_date, revoked_by_ip, revoke_reason, replacing_token_id
            FROM refresh_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .catch()?;

        record.try_into_domain(tokens)
    }
}

#[async_trait]
impl UsersQueries for PgUsersQueries {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User> {
        self.load(*id.as_uuid()).await
    }

    async fn get_user_by_login(&self, login: &UserLogin) -> Result<User> {
        let id = self
            .find_id(
                "SELECT id FROM users WHERE lower(btrim(login)) = $1",
                &login.normalized(),
            )
            .await?;

        self.load(id).await
    }

    async fn get_user_by_email(&self, email: &UserEmail) -> Result<User> {
        let id = self
            .find_id(
                "SELECT id FROM users WHERE lower(btrim(email)) = $1",
                &email.normalized(),
            )
            .await?;

        self.load(id).await
    }

    async fn get_user_by_refresh_token(
        &self,
        token: &RefreshTokenId,
    ) -> Result<User> {
        let id = self
            .find_id(
                "SELECT user_id FROM refresh_tokens \
                 WHERE id = $1 AND user_id IS NOT NULL",
                token.as_str(),
            )
            .await?;

        self.load(id).await
    }

    async fn get_user_by_vk_internal_id(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<User> {
        let id = self
            .find_id(
                r#"
                SELECT u.id
                FROM users u
                JOIN vk_users v ON v.id = u.vk_user_id
                WHERE v.internal_id = $1
                "#,
                internal_id.as_str(),
            )
            .await?;

        self.load(id).await
    }

    async fn is_login_occupied(&self, login: &UserLogin) -> Result<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE lower(btrim(login)) = $1)",
            &login.normalized(),
        )
        .await
    }

    async fn is_email_occupied(&self, email: &UserEmail) -> Result<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE lower(btrim(email)) = $1)",
            &email.normalized(),
        )
        .await
    }

    async fn is_vk_user_exists(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM vk_users WHERE internal_id = $1)",
            internal_id.as_str(),
        )
        .await
    }
}
