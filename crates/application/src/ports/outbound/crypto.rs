//! Interfaces for cryptographic operations.

use domain::auth::password::{Password, UserPasswordHash};

use crate::error::Result;

/// Port for password hashing operations.
pub trait PasswordHasher: Send + Sync {
    /// Hash a password using a secure algorithm.
    fn hash(&self, password: &Password) -> Result<UserPasswordHash>;

    /// Verify a password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` is kept for unreadable hashes
    /// or hasher failures.
    fn verify(
        &self,
        password: &Password,
        hash: &UserPasswordHash,
    ) -> Result<bool>;
}

/// Port for secure random generation.
pub trait SecureRandom: Send + Sync {
    /// Generate random bytes.
    fn random_bytes(&self, length: usize) -> Result<Vec<u8>>;
}
