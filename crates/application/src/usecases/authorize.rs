//! Password authentication use case implementation.

use async_trait::async_trait;
use domain::auth::password::Password;
use domain::error::{DomainError, Violations};
use domain::identity::date::UserAuthorizationDate;
use domain::identity::login::UserLogin;
use tokio_util::sync::CancellationToken;

use crate::dto::{AuthorizeRequestDto, TokenPairDto};
use crate::error::{ApplicationError, Result};
use crate::ports::inbound::Authorize;
use crate::ports::outbound::{
    Clock, CredentialIssuer, PasswordHasher, TelemetryPort, UsersCommands,
    UsersQueries,
};
use crate::usecases::{TokenLifetimes, issue_token_pair};

/// Password authentication use case service.
pub struct AuthorizeUseCase {
    queries: Box<dyn UsersQueries>,
    commands: Box<dyn UsersCommands>,
    hasher: Box<dyn PasswordHasher>,
    issuer: Box<dyn CredentialIssuer>,
    clock: Box<dyn Clock>,
    telemetry: Box<dyn TelemetryPort>,
    lifetimes: TokenLifetimes,
}

impl AuthorizeUseCase {
    pub fn new(
        queries: Box<dyn UsersQueries>,
        commands: Box<dyn UsersCommands>,
        hasher: Box<dyn PasswordHasher>,
        issuer: Box<dyn CredentialIssuer>,
        clock: Box<dyn Clock>,
        telemetry: Box<dyn TelemetryPort>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            queries,
            commands,
            hasher,
            issuer,
            clock,
            telemetry,
            lifetimes,
        }
    }
}

#[async_trait]
impl Authorize for AuthorizeUseCase {
    #[tracing::instrument(skip_all, fields(login = %request.login))]
    async fn execute(
        &self,
        request: AuthorizeRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<TokenPairDto> {
        let mut violations = Violations::new();
        let login = violations.collect(UserLogin::create(request.login));
        let password = violations.collect(Password::create(request.password));

        let (Some(login), Some(password)) = (login, password) else {
            return Err(ApplicationError::Validation(violations));
        };

        let mut user = match self.queries.get_user_by_login(&login).await {
            Ok(user) => user,
            Err(ApplicationError::UserNotFound) => {
                self.telemetry.record_auth_failure("unknown_login");
                return Err(ApplicationError::InvalidCredentials);
            },
            Err(err) => return Err(err),
        };

        // VK-only accounts have no password to check against.
        let verified = match user.password_hash() {
            Some(hash) => self.hasher.verify(&password, hash)?,
            None => false,
        };
        if !verified {
            self.telemetry.record_auth_failure("invalid_password");
            return Err(ApplicationError::InvalidCredentials);
        }

        let now = self.clock.now();
        let (pair, refresh_token) = issue_token_pair(
            self.issuer.as_ref(),
            &user,
            now,
            self.lifetimes,
            request.ip_address.as_deref(),
        )?;
        user.add_refresh_token(refresh_token)?;

        match user.update_authorization_date(
            UserAuthorizationDate::create(now)?,
            false,
        ) {
            Ok(()) => {},
            Err(DomainError::InvalidAuthorizationDate) => {
                tracing::warn!(
                    user_id = %user.id(),
                    "clock is behind last authorization date, keeping it"
                );
            },
            Err(err) => return Err(err.into()),
        }

        self.commands.commit_changes(&mut user, cancellation).await?;

        self.telemetry
            .record_auth_success(&user.id().to_string(), "password");

        Ok(pair)
    }
}
