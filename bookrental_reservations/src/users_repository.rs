pub use in_memory_users_repository::InMemoryUsersRepository;
pub use postgres_users_repository::{PostgresUsersRepository, PostgresUsersRepositoryConfig};

use crate::api::{UserDetails, UserId};

mod in_memory_users_repository;
mod postgres_users_repository;

#[derive(Debug, thiserror::Error)]
pub enum UsersRepositoryError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Failed to deserialize user: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait UsersRepository: Send + Sync {
    /// Adds user to repository, returns an id assigned to the user
    async fn add_user(&self, details: UserDetails) -> Result<UserId, UsersRepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<UserDetails, UsersRepositoryError>;

    /// Ids of all users, ascending
    async fn get_all_user_ids(&self) -> Result<Vec<UserId>, UsersRepositoryError>;
}
