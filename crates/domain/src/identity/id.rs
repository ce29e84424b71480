//! ID logic management.

use std::fmt;

use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Value object of a user identifier.
///
/// Identifiers are random 128-bit values generated when the user is created
/// and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random [`UserId`].
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Converts a string into a [`UserId`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string is not an hyphenated or simple UUID.
    pub fn parse(id: &str) -> Result<Self> {
        Uuid::parse_str(id.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidUserId)
    }

    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_parse_round_trips_display() {
        let id = UserId::new();
        assert_eq!(UserId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            UserId::parse("not-a-uuid"),
            Err(DomainError::InvalidUserId)
        ));
    }
}
