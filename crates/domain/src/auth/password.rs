//! Password logic.

use crate::error::{DomainError, Violations};

/// Value object of a plain-text password, as typed by the user.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Create a new [`Password`].
    ///
    /// Only emptiness is checked here; strength is not enforced.
    pub fn create(value: impl Into<String>) -> Result<Self, Violations> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DomainError::EmptyPassword.into());
        }

        Ok(Self(value))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A hashed password stored in the database.
///
/// Opaque to the domain: the hashing scheme belongs to the password hasher.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPasswordHash(String);

impl UserPasswordHash {
    /// Converts a string into a [`UserPasswordHash`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string is empty or whitespace only.
    pub fn create(hash: impl Into<String>) -> Result<Self, Violations> {
        let hash = hash.into();

        if hash.trim().is_empty() {
            return Err(DomainError::EmptyPasswordHash.into());
        }

        Ok(Self(hash))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for UserPasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPasswordHash")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_hash_is_rejected() {
        let err = UserPasswordHash::create(" \t").unwrap_err();
        assert!(err.contains(&DomainError::EmptyPasswordHash));
    }

    #[test]
    fn test_blank_password_is_rejected() {
        assert!(Password::create("").is_err());
        assert!(Password::create("hunter22").is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let hash = UserPasswordHash::create("$argon2id$secret").unwrap();
        let password = Password::create("secret").unwrap();

        assert!(!format!("{hash:?}").contains("secret"));
        assert!(!format!("{password:?}").contains("secret"));
    }
}
