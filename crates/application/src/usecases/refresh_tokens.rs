//! Refresh token rotation use case implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::auth::reason::RevocationReason;
use domain::auth::refresh_token::RefreshTokenId;
use domain::error::DomainError;
use domain::identity::ip::IpAddress;
use domain::identity::user::User;
use tokio_util::sync::CancellationToken;

use crate::dto::{RefreshTokensRequestDto, TokenPairDto};
use crate::error::{ApplicationError, Result};
use crate::ports::inbound::RefreshTokens;
use crate::ports::outbound::{
    Clock, CredentialIssuer, TelemetryPort, UsersCommands, UsersQueries,
};
use crate::usecases::{TokenLifetimes, issue_token_pair};

/// Times a reuse sweep is retried against a chain that keeps moving.
const SWEEP_ATTEMPTS: usize = 3;

/// Refresh token rotation use case service.
///
/// A refresh token is single use: presenting it revokes it in favour of a new
/// one. Presenting a token that was already revoked means the chain leaked,
/// so every token issued after it is revoked too and the request fails.
pub struct RefreshTokensUseCase {
    queries: Box<dyn UsersQueries>,
    commands: Box<dyn UsersCommands>,
    issuer: Box<dyn CredentialIssuer>,
    clock: Box<dyn Clock>,
    telemetry: Box<dyn TelemetryPort>,
    lifetimes: TokenLifetimes,
}

impl RefreshTokensUseCase {
    pub fn new(
        queries: Box<dyn UsersQueries>,
        commands: Box<dyn UsersCommands>,
        issuer: Box<dyn CredentialIssuer>,
        clock: Box<dyn Clock>,
        telemetry: Box<dyn TelemetryPort>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            queries,
            commands,
            issuer,
            clock,
            telemetry,
            lifetimes,
        }
    }
}

impl RefreshTokensUseCase {
    /// Revoke every live successor of `presented` and persist it.
    ///
    /// If a rotation was committed after `user` was loaded, the store refuses
    /// the sweep and the user is reloaded and swept again. Returns how many
    /// tokens were revoked.
    async fn sweep_chain(
        &self,
        mut user: User,
        presented: &RefreshTokenId,
        now: DateTime<Utc>,
        ip: &IpAddress,
        cancellation: &CancellationToken,
    ) -> Result<usize> {
        let mut attempt = 1;
        loop {
            let swept = user.revoke_descendants(
                presented,
                now,
                ip,
                &RevocationReason::ReuseDetected,
            )?;
            match self.commands.commit_changes(&mut user, cancellation).await {
                Ok(()) => return Ok(swept.len()),
                Err(ApplicationError::ConcurrentRevocation)
                    if attempt < SWEEP_ATTEMPTS =>
                {
                    tracing::debug!(
                        user_id = %user.id(),
                        attempt,
                        "chain moved during reuse sweep, reloading"
                    );
                    attempt += 1;
                    user =
                        self.queries.get_user_by_refresh_token(presented).await?;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl RefreshTokens for RefreshTokensUseCase {
    #[tracing::instrument(skip_all)]
    async fn execute(
        &self,
        request: RefreshTokensRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<TokenPairDto> {
        let presented = RefreshTokenId::create(request.refresh_token)?;
        let mut user =
            self.queries.get_user_by_refresh_token(&presented).await?;

        let now = self.clock.now();
        let token = user
            .refresh_token(&presented)
            .ok_or(DomainError::RevokingTokenNotFound)?;
        let (revoked, expired) = (token.is_revoked(), token.is_expired(now));

        let ip = IpAddress::parse_or_unspecified(request.ip_address.as_deref());

        if revoked {
            let user_id = user.id();
            let swept = self
                .sweep_chain(user, &presented, now, &ip, cancellation)
                .await?;
            tracing::warn!(
                %user_id,
                %ip,
                revoked = swept,
                "revoked refresh token presented again"
            );
            self.telemetry.record_token_reuse(&user_id.to_string(), swept);

            return Err(ApplicationError::RefreshTokenReused);
        }

        if expired {
            self.telemetry.record_auth_failure("refresh_token_expired");
            return Err(ApplicationError::RefreshTokenExpired);
        }

        let (pair, replacement) = issue_token_pair(
            self.issuer.as_ref(),
            &user,
            now,
            self.lifetimes,
            request.ip_address.as_deref(),
        )?;
        user.revoke_token(
            &presented,
            now,
            ip,
            RevocationReason::Rotation,
            Some(replacement),
        )?;

        self.commands.commit_changes(&mut user, cancellation).await?;

        tracing::debug!(user_id = %user.id(), "refresh token rotated");
        self.telemetry
            .record_auth_success(&user.id().to_string(), "refresh_token");

        Ok(pair)
    }
}
