//! These traits define what the application can do.

pub mod authorize;
pub mod external;
pub mod refresh_token;
pub mod register;
pub mod user;

pub use authorize::*;
pub use external::*;
pub use refresh_token::*;
pub use register::*;
pub use user::*;
