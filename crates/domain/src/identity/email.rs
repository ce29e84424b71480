//! Email logic management.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{DomainError, Violations};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").unwrap()
});

/// Value object of a valid email address.
///
/// The address is kept as typed; equality and hashing use the trimmed,
/// lowercased form.
#[derive(Debug, Clone)]
pub struct UserEmail(String);

impl UserEmail {
    /// Maximum email length.
    pub const MAX_LENGTH: usize = 255;

    /// Converts a string into a valid [`UserEmail`].
    ///
    /// # Errors
    ///
    /// Returns every broken rule: empty value, too long value or a value that
    /// is not shaped like `local@domain.tld`.
    pub fn create(email: impl Into<String>) -> Result<Self, Violations> {
        let email = email.into();
        let mut errors = Violations::new();

        if email.trim().is_empty() {
            errors.push(DomainError::EmptyEmail);
            return Err(errors);
        }

        if email.chars().count() > Self::MAX_LENGTH {
            errors.push(DomainError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !EMAIL_RE.is_match(email.trim()) {
            errors.push(DomainError::InvalidEmailFormat);
        }

        errors.into_result()?;
        Ok(Self(email))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trimmed, lowercased form used for comparisons and lookups.
    pub fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }
}

impl PartialEq for UserEmail {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for UserEmail {}

impl std::hash::Hash for UserEmail {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for UserEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
