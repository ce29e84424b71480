//! These traits define what the application needs from the outside world.

pub mod clock;
pub mod crypto;
pub mod oauth;
pub mod telemetry;
pub mod token;
pub mod users;

pub use clock::*;
pub use crypto::*;
pub use oauth::*;
pub use telemetry::*;
pub use token::*;
pub use users::*;
