//! External OAuth sign-in use case port.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dto::{ObtainExternalTokenRequestDto, ObtainExternalTokenResponseDto};
use crate::error::Result;

/// Inbound port for signing in through VK.
#[async_trait]
pub trait ObtainExternalToken: Send + Sync {
    /// Exchange an authorization code, creating the user on first sign-in.
    async fn execute(
        &self,
        request: ObtainExternalTokenRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<ObtainExternalTokenResponseDto>;
}
