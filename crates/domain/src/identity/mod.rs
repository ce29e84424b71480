//! User identity domain.

pub mod date;
pub mod email;
pub mod id;
pub mod ip;
pub mod login;
pub mod user;
