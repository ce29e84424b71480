//! Custom error handler for domain (core).

use std::fmt;

pub type Result<T> = std::result::Result<T, DomainError>;

/// Enum representing custom domain errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("login null or empty")]
    EmptyLogin,
    #[error("login must be between {min} and {max} characters length")]
    InvalidLoginLength { min: usize, max: usize },
    #[error("login {login} is already occupied")]
    LoginIsOccupied { login: String },

    #[error("email null or empty")]
    EmptyEmail,
    #[error("email must be at most {max} characters length")]
    EmailTooLong { max: usize },
    #[error("invalid email formatting")]
    InvalidEmailFormat,
    #[error("email {email} is already occupied")]
    EmailIsOccupied { email: String },

    #[error("password null or empty")]
    EmptyPassword,
    #[error("password hash null or empty")]
    EmptyPasswordHash,

    #[error("{field} is not specified")]
    DateNotSpecified { field: &'static str },
    #[error("registration date must not precede {floor}")]
    RegistrationDateTooEarly { floor: String },
    #[error("authorization date cannot go backwards")]
    InvalidAuthorizationDate,

    #[error("user id must be a valid uuid")]
    InvalidUserId,
    #[error("refresh token null or empty")]
    EmptyRefreshToken,
    #[error("revoking refresh token not found")]
    RevokingTokenNotFound,

    #[error("an external identity is already linked to this user")]
    ExternalIdentityAlreadyLinked,
    #[error("{field} null or empty")]
    MissingCredential { field: &'static str },
}

impl DomainError {
    /// Whether the error reports a uniqueness conflict rather than a malformed
    /// input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::LoginIsOccupied { .. }
                | Self::EmailIsOccupied { .. }
                | Self::ExternalIdentityAlreadyLinked
        )
    }

    /// Name of the input field the error relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyLogin
            | Self::InvalidLoginLength { .. }
            | Self::LoginIsOccupied { .. } => "login",
            Self::EmptyEmail
            | Self::EmailTooLong { .. }
            | Self::InvalidEmailFormat
            | Self::EmailIsOccupied { .. } => "email",
            Self::EmptyPassword | Self::EmptyPasswordHash => "password",
            Self::DateNotSpecified { field } => field,
            Self::RegistrationDateTooEarly { .. } => "registration_date",
            Self::InvalidAuthorizationDate => "authorization_date",
            Self::InvalidUserId => "id",
            Self::EmptyRefreshToken | Self::RevokingTokenNotFound => {
                "refresh_token"
            },
            Self::ExternalIdentityAlreadyLinked => "external_identity",
            Self::MissingCredential { field } => field,
        }
    }
}

/// Non-empty list of [`DomainError`] collected while validating an input.
///
/// Value objects report every rule they break at once so callers can return a
/// complete error list instead of stopping on the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<DomainError>);

impl Violations {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a single error.
    pub fn push(&mut self, error: DomainError) {
        self.0.push(error);
    }

    /// Merge another list into this one.
    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    /// Record the error side of `result`, returning its value if any.
    pub fn collect<T>(
        &mut self,
        result: std::result::Result<T, Violations>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(errors) => {
                self.extend(errors);
                None
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DomainError> {
        self.0.iter()
    }

    /// Whether any collected error is a uniqueness conflict.
    pub fn has_conflict(&self) -> bool {
        self.0.iter().any(DomainError::is_conflict)
    }

    pub fn contains(&self, error: &DomainError) -> bool {
        self.0.contains(error)
    }

    /// Turn the collector into a `Result`, failing if anything was recorded.
    pub fn into_result(self) -> std::result::Result<(), Violations> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Default for Violations {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DomainError> for Violations {
    fn from(error: DomainError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for Violations {
    type Item = DomainError;
    type IntoIter = std::vec::IntoIter<DomainError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}
