//! VK sign-in use case implementation.

use async_trait::async_trait;
use domain::error::{DomainError, Violations};
use domain::external::vk::{VkInternalUserId, VkUser};
use domain::identity::date::{UserAuthorizationDate, UserRegistrationDate};
use domain::identity::email::UserEmail;
use domain::identity::user::User;
use tokio_util::sync::CancellationToken;

use crate::dto::{ObtainExternalTokenRequestDto, ObtainExternalTokenResponseDto};
use crate::error::{ApplicationError, Result};
use crate::ports::inbound::ObtainExternalToken;
use crate::ports::outbound::{
    Clock, OAuthCredentials, OAuthProvider, TelemetryPort, UsersCommands,
    UsersQueries,
};

const METHOD: &str = "vk";

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    violations: &mut Violations,
) -> Option<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            violations.push(DomainError::MissingCredential { field });
            None
        },
    }
}

/// VK authorization code exchange use case service.
pub struct ObtainExternalTokenUseCase {
    queries: Box<dyn UsersQueries>,
    commands: Box<dyn UsersCommands>,
    provider: Box<dyn OAuthProvider>,
    credentials: OAuthCredentials,
    clock: Box<dyn Clock>,
    telemetry: Box<dyn TelemetryPort>,
}

impl ObtainExternalTokenUseCase {
    pub fn new(
        queries: Box<dyn UsersQueries>,
        commands: Box<dyn UsersCommands>,
        provider: Box<dyn OAuthProvider>,
        credentials: OAuthCredentials,
        clock: Box<dyn Clock>,
        telemetry: Box<dyn TelemetryPort>,
    ) -> Self {
        Self {
            queries,
            commands,
            provider,
            credentials,
            clock,
            telemetry,
        }
    }

    /// Load the user linked to `internal_id` and move its sign-in date.
    async fn sign_in(&self, internal_id: &VkInternalUserId) -> Result<User> {
        let mut user =
            self.queries.get_user_by_vk_internal_id(internal_id).await?;
        let now = UserAuthorizationDate::create(self.clock.now())?;

        user.update_authorization_date(now, false)?;

        Ok(user)
    }

    /// Create a password-less user linked to a new VK identity.
    async fn sign_up(
        &self,
        internal_id: VkInternalUserId,
        email: Option<String>,
    ) -> Result<User> {
        let email = UserEmail::create(email.unwrap_or_default())?;
        if self.queries.is_email_occupied(&email).await? {
            return Err(DomainError::EmailIsOccupied {
                email: email.to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let mut user = User::create(
            None,
            email,
            UserRegistrationDate::create(now)?,
            UserAuthorizationDate::create(now)?,
            None,
        )?;
        user.attach_external_identity(VkUser::create(internal_id))?;

        Ok(user)
    }
}

#[async_trait]
impl ObtainExternalToken for ObtainExternalTokenUseCase {
    #[tracing::instrument(skip_all)]
    async fn execute(
        &self,
        request: ObtainExternalTokenRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<ObtainExternalTokenResponseDto> {
        let mut violations = Violations::new();
        let code =
            required(Some(request.code.as_str()), "code", &mut violations);
        let client_id = required(
            self.credentials.client_id.as_deref(),
            "client_id",
            &mut violations,
        );
        let client_secret = required(
            self.credentials.client_secret.as_deref(),
            "client_secret",
            &mut violations,
        );
        let redirect_uri = required(
            self.credentials.redirect_uri.as_deref(),
            "redirect_uri",
            &mut violations,
        );

        let (
            Some(code),
            Some(client_id),
            Some(client_secret),
            Some(redirect_uri),
        ) = (code, client_id, client_secret, redirect_uri)
        else {
            return Err(ApplicationError::Validation(violations));
        };

        let external = self
            .provider
            .get_access_token(
                client_id,
                client_secret,
                redirect_uri,
                code,
                cancellation,
            )
            .await
            .inspect_err(|_| self.telemetry.record_auth_failure("oauth_vk"))?;

        let internal_id = VkInternalUserId::create(external.user_id);
        let is_new = !self.queries.is_vk_user_exists(&internal_id).await?;

        let mut user = if is_new {
            self.sign_up(internal_id, external.email).await?
        } else {
            self.sign_in(&internal_id).await?
        };

        self.commands.commit_changes(&mut user, cancellation).await?;

        let user_id = user.id().to_string();
        if is_new {
            tracing::info!(%user_id, "user registered through vk");
            self.telemetry.record_account_created(&user_id, METHOD);
        }
        self.telemetry.record_auth_success(&user_id, METHOD);

        Ok(ObtainExternalTokenResponseDto {
            access_token: external.access_token,
            is_new,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Duration;

    use super::*;
    use crate::usecases::fakes::{
        FakeOAuth, FixedClock, InMemoryUsers, RecordingTelemetry, now,
    };

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            client_id: Some("51234567".into()),
            client_secret: Some("secret".into()),
            redirect_uri: Some("https://passage.local/vk/callback".into()),
        }
    }

    fn use_case(
        users: &InMemoryUsers,
        provider: &FakeOAuth,
        clock: &FixedClock,
        credentials: OAuthCredentials,
    ) -> ObtainExternalTokenUseCase {
        ObtainExternalTokenUseCase::new(
            Box::new(users.clone()),
            Box::new(users.clone()),
            Box::new(provider.clone()),
            credentials,
            Box::new(clock.clone()),
            Box::new(RecordingTelemetry::default()),
        )
    }

    fn request(code: &str) -> ObtainExternalTokenRequestDto {
        ObtainExternalTokenRequestDto { code: code.into() }
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_user() {
        let users = InMemoryUsers::default();
        let provider = FakeOAuth::returning("1001", Some("bob@vk.com"));
        let clock = FixedClock::new(now());

        let response = use_case(&users, &provider, &clock, credentials())
            .execute(request("code"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(response.is_new);
        assert_eq!(response.access_token, "vk-access");

        let internal_id = VkInternalUserId::create("1001");
        let user =
            users.get_user_by_vk_internal_id(&internal_id).await.unwrap();
        assert_eq!(user.email().as_str(), "bob@vk.com");
        assert!(user.login().is_none());
        assert!(user.password_hash().is_none());
    }

    #[tokio::test]
    async fn test_second_sign_in_reuses_user() {
        let users = InMemoryUsers::default();
        let provider = FakeOAuth::returning("1001", Some("bob@vk.com"));
        let clock = FixedClock::new(now());
        let vk = use_case(&users, &provider, &clock, credentials());

        vk.execute(request("first"), &CancellationToken::new())
            .await
            .unwrap();
        clock.advance(Duration::hours(1));
        let response = vk
            .execute(request("second"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!response.is_new);
        assert_eq!(users.len(), 1);
        let internal_id = VkInternalUserId::create("1001");
        let user =
            users.get_user_by_vk_internal_id(&internal_id).await.unwrap();
        assert_eq!(
            user.authorization_date().value(),
            now() + Duration::hours(1)
        );
        assert_eq!(user.registration_date().value(), now());
    }

    #[tokio::test]
    async fn test_sign_in_with_clock_behind_fails() {
        let users = InMemoryUsers::default();
        let provider = FakeOAuth::returning("1001", Some("bob@vk.com"));
        let clock = FixedClock::new(now());
        use_case(&users, &provider, &clock, credentials())
            .execute(request("first"), &CancellationToken::new())
            .await
            .unwrap();

        let behind = FixedClock::new(now() - Duration::hours(1));
        let err = use_case(&users, &provider, &behind, credentials())
            .execute(request("second"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidAuthorizationDate)
        ));
        let internal_id = VkInternalUserId::create("1001");
        let user =
            users.get_user_by_vk_internal_id(&internal_id).await.unwrap();
        assert_eq!(user.authorization_date().value(), now());
    }

    #[tokio::test]
    async fn test_email_collision_is_conflict() {
        let users = InMemoryUsers::default();
        let clock = FixedClock::new(now());
        use_case(
            &users,
            &FakeOAuth::returning("1001", Some("bob@vk.com")),
            &clock,
            credentials(),
        )
        .execute(request("code"), &CancellationToken::new())
        .await
        .unwrap();

        let err = use_case(
            &users,
            &FakeOAuth::returning("2002", Some(" BOB@vk.com")),
            &clock,
            credentials(),
        )
        .execute(request("code"), &CancellationToken::new())
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::EmailIsOccupied { .. })
        ));
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_are_aggregated() {
        let users = InMemoryUsers::default();
        let provider = FakeOAuth::returning("1001", None);
        let clock = FixedClock::new(now());

        let vk =
            use_case(&users, &provider, &clock, OAuthCredentials::default());
        let err = vk
            .execute(request(" "), &CancellationToken::new())
            .await
            .unwrap_err();

        let ApplicationError::Validation(violations) = err else {
            panic!("expected violations");
        };
        let fields: Vec<_> =
            violations.iter().map(DomainError::field).collect();
        assert_eq!(
            fields,
            vec!["code", "client_id", "client_secret", "redirect_uri"]
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let users = InMemoryUsers::default();
        let provider = FakeOAuth::failing("invalid_grant", "Code is expired.");
        let clock = FixedClock::new(now());

        let err = use_case(&users, &provider, &clock, credentials())
            .execute(request("code"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::OAuthProvider { .. }));
        assert_eq!(users.len(), 0);
    }
}
