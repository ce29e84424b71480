//! Outbound adapters.

pub mod clock;
pub mod crypto;
pub mod jwt;
pub mod oauth;
pub mod persistence;
pub mod telemetry;
