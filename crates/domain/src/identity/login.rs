//! Login logic management.

use std::fmt;

use crate::error::{DomainError, Violations};

/// Value object of a login (public user handle).
#[derive(Debug, Clone)]
pub struct UserLogin(String);

impl UserLogin {
    /// Minimum login length.
    pub const MIN_LENGTH: usize = 5;
    /// Maximum login length.
    pub const MAX_LENGTH: usize = 255;

    /// Converts a string into a valid [`UserLogin`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the login is blank or its length is outside
    /// `[MIN_LENGTH, MAX_LENGTH]`. Both are reported when both apply.
    pub fn create(login: impl Into<String>) -> Result<Self, Violations> {
        let login = login.into();
        let mut errors = Violations::new();

        if login.trim().is_empty() {
            errors.push(DomainError::EmptyLogin);
        }

        let len = login.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            errors.push(DomainError::InvalidLoginLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        errors.into_result()?;
        Ok(Self(login))
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

impl PartialEq for UserLogin {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for UserLogin {}

impl fmt::Display for UserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserLogin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_login() {
        assert_eq!(UserLogin::create("alice1").unwrap().as_str(), "alice1");
    }

    #[test]
    fn test_empty_login_reports_both_rules() {
        let err = UserLogin::create("").unwrap_err();
        assert!(err.contains(&DomainError::EmptyLogin));
        assert!(err.contains(&DomainError::InvalidLoginLength {
            min: 5,
            max: 255
        }));
    }

    #[test]
    fn test_length_bounds() {
        assert!(UserLogin::create("abcd").is_err());
        assert!(UserLogin::create("abcde").is_ok());
        assert!(UserLogin::create("a".repeat(255)).is_ok());
        assert!(UserLogin::create("a".repeat(256)).is_err());
    }

    #[test]
    fn test_equality_is_normalized() {
        assert_eq!(
            UserLogin::create(" Alice1 ").unwrap(),
            UserLogin::create("alice1").unwrap()
        );
    }
}
