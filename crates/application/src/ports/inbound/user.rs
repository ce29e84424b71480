//! User query port.

use async_trait::async_trait;

use crate::dto::UserDto;
use crate::error::Result;

/// Inbound port for reading a user.
#[async_trait]
pub trait GetUserById: Send + Sync {
    async fn execute(&self, id: &str) -> Result<UserDto>;
}
