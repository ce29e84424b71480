//! User aggregate persistence ports.

use async_trait::async_trait;
use domain::auth::refresh_token::RefreshTokenId;
use domain::external::vk::VkInternalUserId;
use domain::identity::email::UserEmail;
use domain::identity::id::UserId;
use domain::identity::login::UserLogin;
use domain::identity::user::User;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Port for reading users.
///
/// Lookups fail with [`crate::error::ApplicationError::UserNotFound`] when no
/// user matches. Logins and emails are compared trimmed and
/// case-insensitively.
#[async_trait]
pub trait UsersQueries: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User>;

    async fn get_user_by_login(&self, login: &UserLogin) -> Result<User>;

    async fn get_user_by_email(&self, email: &UserEmail) -> Result<User>;

    /// Find the owner of a refresh token.
    async fn get_user_by_refresh_token(
        &self,
        token: &RefreshTokenId,
    ) -> Result<User>;

    async fn get_user_by_vk_internal_id(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<User>;

    async fn is_login_occupied(&self, login: &UserLogin) -> Result<bool>;

    async fn is_email_occupied(&self, email: &UserEmail) -> Result<bool>;

    async fn is_vk_user_exists(
        &self,
        internal_id: &VkInternalUserId,
    ) -> Result<bool>;
}

/// Port for writing users.
#[async_trait]
pub trait UsersCommands: Send + Sync {
    /// Persist every pending event of `user` atomically, then clear them.
    ///
    /// On error (including cancellation) nothing is written and the events
    /// are kept.
    async fn commit_changes(
        &self,
        user: &mut User,
        cancellation: &CancellationToken,
    ) -> Result<()>;
}
