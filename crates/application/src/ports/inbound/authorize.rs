//! Authentication use case ports.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dto::{AuthorizeRequestDto, TokenPairDto};
use crate::error::Result;
use crate::ports::outbound::Claims;

/// Inbound port for password authentication.
#[async_trait]
pub trait Authorize: Send + Sync {
    /// Authenticate a user with login and password.
    async fn execute(
        &self,
        request: AuthorizeRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<TokenPairDto>;
}

/// Inbound port for access token validation.
pub trait ValidateAccessToken: Send + Sync {
    /// Claims of a valid token, empty otherwise.
    fn execute(&self, token: &str) -> Claims;
}
