//! User lookup use case implementation.

use async_trait::async_trait;
use domain::identity::id::UserId;

use crate::dto::UserDto;
use crate::error::Result;
use crate::ports::inbound::GetUserById;
use crate::ports::outbound::UsersQueries;

/// User lookup use case service.
pub struct GetUserByIdUseCase {
    queries: Box<dyn UsersQueries>,
}

impl GetUserByIdUseCase {
    pub fn new(queries: Box<dyn UsersQueries>) -> Self {
        Self { queries }
    }
}

#[async_trait]
impl GetUserById for GetUserByIdUseCase {
    async fn execute(&self, id: &str) -> Result<UserDto> {
        let id = UserId::parse(id)?;
        let user = self.queries.get_user_by_id(&id).await?;

        Ok(UserDto::from(&user))
    }
}
