//! Core domain of the authentication service: users, their refresh tokens
//! and linked external identities.

pub mod auth;
pub mod error;
pub mod event;
pub mod external;
pub mod identity;
