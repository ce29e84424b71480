//! Account registration use case port.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dto::RegisterRequestDto;
use crate::error::Result;

/// Inbound port for account registration.
#[async_trait]
pub trait Register: Send + Sync {
    /// Create a new password account.
    async fn execute(
        &self,
        request: RegisterRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<()>;
}
