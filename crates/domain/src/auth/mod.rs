//! Authentification domain.

pub mod password;
pub mod reason;
pub mod refresh_token;
