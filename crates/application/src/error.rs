//! Application-level errors.

use domain::error::{DomainError, Violations};

pub type Result<T> = std::result::Result<T, ApplicationError>;

/// Errors that can occur in the application layer.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid request: {0}")]
    Validation(#[from] Violations),

    #[error("user not found")]
    UserNotFound,
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("refresh token has already been used")]
    RefreshTokenReused,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("refresh token was revoked by a concurrent request")]
    ConcurrentRevocation,

    #[error("operation cancelled")]
    Cancelled,
    #[error("no private key configured to sign tokens")]
    PrivateKeyMissing,
    #[error("oauth provider error {error}: {description}")]
    OAuthProvider { error: String, description: String },

    #[error("internal server error")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ApplicationError {
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(err))
    }
}

pub trait ToInternal<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToInternal<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(|e| ApplicationError::Internal(Box::new(e)))
    }
}
