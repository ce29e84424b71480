//! Account registration use case implementation.

use async_trait::async_trait;
use domain::auth::password::Password;
use domain::error::{DomainError, Violations};
use domain::identity::date::{UserAuthorizationDate, UserRegistrationDate};
use domain::identity::email::UserEmail;
use domain::identity::login::UserLogin;
use domain::identity::user::User;
use tokio_util::sync::CancellationToken;

use crate::dto::RegisterRequestDto;
use crate::error::{ApplicationError, Result};
use crate::ports::inbound::Register;
use crate::ports::outbound::{
    Clock, PasswordHasher, TelemetryPort, UsersCommands, UsersQueries,
};

/// Account registration use case service.
pub struct RegisterUseCase {
    queries: Box<dyn UsersQueries>,
    commands: Box<dyn UsersCommands>,
    hasher: Box<dyn PasswordHasher>,
    clock: Box<dyn Clock>,
    telemetry: Box<dyn TelemetryPort>,
}

impl RegisterUseCase {
    pub fn new(
        queries: Box<dyn UsersQueries>,
        commands: Box<dyn UsersCommands>,
        hasher: Box<dyn PasswordHasher>,
        clock: Box<dyn Clock>,
        telemetry: Box<dyn TelemetryPort>,
    ) -> Self {
        Self {
            queries,
            commands,
            hasher,
            clock,
            telemetry,
        }
    }
}

#[async_trait]
impl Register for RegisterUseCase {
    #[tracing::instrument(skip_all, fields(login = %request.login))]
    async fn execute(
        &self,
        request: RegisterRequestDto,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let mut violations = Violations::new();
        let login = violations.collect(UserLogin::create(request.login));
        let email = violations.collect(UserEmail::create(request.email));
        let password = violations.collect(Password::create(request.password));

        let login_check = async {
            match &login {
                Some(login) => self.queries.is_login_occupied(login).await,
                None => Ok(false),
            }
        };
        let email_check = async {
            match &email {
                Some(email) => self.queries.is_email_occupied(email).await,
                None => Ok(false),
            }
        };
        let (login_occupied, email_occupied) =
            tokio::join!(login_check, email_check);

        if let (true, Some(login)) = (login_occupied?, &login) {
            violations.push(DomainError::LoginIsOccupied {
                login: login.to_string(),
            });
        }
        if let (true, Some(email)) = (email_occupied?, &email) {
            violations.push(DomainError::EmailIsOccupied {
                email: email.to_string(),
            });
        }

        let (login, email, password) = match (login, email, password) {
            (Some(login), Some(email), Some(password))
                if violations.is_empty() =>
            {
                (login, email, password)
            },
            _ => {
                self.telemetry.record_auth_failure("registration_rejected");
                return Err(ApplicationError::Validation(violations));
            },
        };

        let password_hash = self.hasher.hash(&password)?;
        let now = self.clock.now();

        let mut user = User::create(
            Some(password_hash),
            email,
            UserRegistrationDate::create(now)?,
            UserAuthorizationDate::create(now)?,
            Some(login),
        )?;

        self.commands.commit_changes(&mut user, cancellation).await?;

        tracing::info!(user_id = %user.id(), "user registered");
        self.telemetry
            .record_account_created(&user.id().to_string(), "password");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fakes::{
        FakeHasher, FixedClock, InMemoryUsers, RecordingTelemetry, now,
    };

    fn use_case(users: &InMemoryUsers) -> RegisterUseCase {
        RegisterUseCase::new(
            Box::new(users.clone()),
            Box::new(users.clone()),
            Box::new(FakeHasher),
            Box::new(FixedClock::new(now())),
            Box::new(RecordingTelemetry::default()),
        )
    }

    fn request(login: &str, email: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            login: login.into(),
            password: "correct horse".into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let users = InMemoryUsers::default();
        let token = CancellationToken::new();

        use_case(&users)
            .execute(request("alice01", "alice@example.com"), &token)
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        let login = UserLogin::create("alice01").unwrap();
        let user = users.get_user_by_login(&login).await.unwrap();
        assert_eq!(user.email().as_str(), "alice@example.com");
        assert_eq!(user.registration_date().value(), now());
        assert_eq!(
            user.password_hash().unwrap().as_str(),
            "hashed:correct horse"
        );
        assert!(user.pending_events().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_login_is_rejected_case_insensitively() {
        let users = InMemoryUsers::default();
        let token = CancellationToken::new();
        let register = use_case(&users);

        register
            .execute(request("alice01", "alice@example.com"), &token)
            .await
            .unwrap();
        let err = register
            .execute(request("  ALICE01 ", "other@example.com"), &token)
            .await
            .unwrap_err();

        match err {
            ApplicationError::Validation(violations) => {
                assert_eq!(violations.len(), 1);
                assert!(violations.has_conflict());
                assert_eq!(violations.iter().next().unwrap().field(), "login");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_conflicts_are_reported_together() {
        let users = InMemoryUsers::default();
        let token = CancellationToken::new();
        let register = use_case(&users);

        register
            .execute(request("alice01", "alice@example.com"), &token)
            .await
            .unwrap();
        let err = register
            .execute(request("alice01", "Alice@Example.com"), &token)
            .await
            .unwrap_err();

        let ApplicationError::Validation(violations) = err else {
            panic!("expected violations");
        };
        assert_eq!(violations.len(), 2);
        assert!(violations.contains(&DomainError::LoginIsOccupied {
            login: "alice01".into()
        }));
        assert!(violations.contains(&DomainError::EmailIsOccupied {
            email: "Alice@Example.com".into()
        }));
    }

    #[tokio::test]
    async fn test_invalid_input_is_aggregated() {
        let users = InMemoryUsers::default();
        let token = CancellationToken::new();

        let err = use_case(&users)
            .execute(
                RegisterRequestDto {
                    login: "abc".into(),
                    password: "   ".into(),
                    email: "not-an-email".into(),
                },
                &token,
            )
            .await
            .unwrap_err();

        let ApplicationError::Validation(violations) = err else {
            panic!("expected violations");
        };
        assert!(violations.contains(&DomainError::EmptyPassword));
        assert!(violations.contains(&DomainError::InvalidEmailFormat));
        assert!(violations.iter().any(|e| e.field() == "login"));
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_commit_stores_nothing() {
        let users = InMemoryUsers::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = use_case(&users)
            .execute(request("alice01", "alice@example.com"), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Cancelled));
        assert_eq!(users.len(), 0);
    }
}
