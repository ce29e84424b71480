//! PostgreSQL persistence of the user aggregate.

mod models;
mod users_commands;
mod users_queries;

pub use users_commands::PgUsersCommands;
pub use users_queries::PgUsersQueries;
