//! Cryptographic adapters.

mod argon2;
mod random;

pub use argon2::Argon2PasswordHasher;
pub use random::OsRngRandom;
