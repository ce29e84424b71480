//! Argon2id password hasher implementation.

use application::error::{Result, ToInternal};
use application::ports::outbound::PasswordHasher;
use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use domain::auth::password::{Password, UserPasswordHash};
use rand::rngs::OsRng;

const OUTPUT_LENGTH: usize = 32;

/// Argon2id password hasher adapter.
///
/// Hashes are PHC strings, so verification reads the parameters from the
/// stored hash and keeps working after the configured cost changes.
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Create a new Argon2 hasher with custom parameters.
    pub fn new(
        memory_cost: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self> {
        let params = Params::new(
            memory_cost,
            iterations,
            parallelism,
            Some(OUTPUT_LENGTH),
        )
        .catch()?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<UserPasswordHash> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .catch()?;

        Ok(UserPasswordHash::create(hash.to_string())?)
    }

    fn verify(
        &self,
        password: &Password,
        hash: &UserPasswordHash,
    ) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash.as_str()).catch()?;

        match self
            .argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(err) => Err(err).catch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use application::error::ApplicationError;

    use super::*;

    fn hasher() -> Argon2PasswordHasher {
        // Minimal cost keeps the tests fast.
        Argon2PasswordHasher::new(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let password = Password::create("correct horse").unwrap();

        let hash = hasher.hash(&password).unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify(&password, &hash).unwrap());
        assert!(
            !hasher
                .verify(&Password::create("wrong horse").unwrap(), &hash)
                .unwrap()
        );
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = hasher();
        let password = Password::create("correct horse").unwrap();

        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unreadable_hash_is_an_error() {
        let hash = UserPasswordHash::create("plaintext").unwrap();
        let password = Password::create("plaintext").unwrap();

        let result = hasher().verify(&password, &hash);

        assert!(matches!(result, Err(ApplicationError::Internal(_))));
    }
}
