//! Refresh token revocation (logout) use case implementation.

use async_trait::async_trait;
use domain::auth::reason::RevocationReason;
use domain::auth::refresh_token::RefreshTokenId;
use domain::identity::ip::IpAddress;
use tokio_util::sync::CancellationToken;

use crate::dto::RevokeRefreshTokenRequestDto;
use crate::error::{ApplicationError, Result};
use crate::ports::inbound::RevokeRefreshToken;
use crate::ports::outbound::{Clock, UsersCommands, UsersQueries};

/// Refresh token revocation use case service.
pub struct RevokeRefreshTokenUseCase {
    queries: Box<dyn UsersQueries>,
    commands: Box<dyn UsersCommands>,
    clock: Box<dyn Clock>,
}

impl RevokeRefreshTokenUseCase {
    pub fn new(
        queries: Box<dyn UsersQueries>,
        commands: Box<dyn UsersCommands>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            queries,
            commands,
            clock,
        }
    }
}

#[async_trait]
impl RevokeRefreshToken for RevokeRefreshTokenUseCase {
    #[tracing::instrument(skip_all)]
    async fn execute(
        &self,
        request: RevokeRefreshTokenRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let token = RefreshTokenId::create(request.refresh_token)?;

        let owner = self.queries.get_user_by_refresh_token(&token).await;
        let mut user = match owner {
            Ok(user) => user,
            Err(ApplicationError::UserNotFound) => {
                tracing::debug!("revoking unknown refresh token");
                return Ok(());
            },
            Err(err) => return Err(err),
        };

        if user.refresh_token(&token).is_none() {
            return Ok(());
        }

        user.revoke_token(
            &token,
            self.clock.now(),
            IpAddress::parse_or_unspecified(request.ip_address.as_deref()),
            RevocationReason::from_input(request.reason.as_deref()),
            None,
        )?;

        match self.commands.commit_changes(&mut user, cancellation).await {
            Ok(()) => {},
            Err(ApplicationError::ConcurrentRevocation) => {
                tracing::debug!(
                    user_id = %user.id(),
                    "refresh token already revoked by another request"
                );
                return Ok(());
            },
            Err(err) => return Err(err),
        }

        tracing::info!(user_id = %user.id(), "refresh token revoked");

        Ok(())
    }
}
