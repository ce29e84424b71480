//! Refresh token use case ports.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dto::{
    RefreshTokensRequestDto, RevokeRefreshTokenRequestDto, TokenPairDto,
};
use crate::error::Result;

/// Inbound port for refresh token rotation.
#[async_trait]
pub trait RefreshTokens: Send + Sync {
    /// Exchange a refresh token for a new pair of tokens.
    async fn execute(
        &self,
        request: RefreshTokensRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<TokenPairDto>;
}

/// Inbound port for refresh token revocation.
#[async_trait]
pub trait RevokeRefreshToken: Send + Sync {
    /// Revoke a refresh token. Unknown tokens are ignored.
    async fn execute(
        &self,
        request: RevokeRefreshTokenRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<()>;
}
