use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{UserDetails, UserId};
use crate::users_repository::{UsersRepository, UsersRepositoryError};

pub struct InMemoryUsersRepository {
    users: parking_lot::RwLock<HashMap<UserId, UserDetails>>,
    user_sequence_generator: AtomicI32,
}

impl Default for InMemoryUsersRepository {
    fn default() -> Self {
        Self {
            users: Default::default(),
            user_sequence_generator: AtomicI32::new(1),
        }
    }
}

#[async_trait::async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn add_user(&self, details: UserDetails) -> Result<UserId, UsersRepositoryError> {
        let id = self.user_sequence_generator.fetch_add(1, Ordering::Relaxed);
        self.users.write().insert(id, details);
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<UserDetails, UsersRepositoryError> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(UsersRepositoryError::UserNotFound(id))
    }

    async fn get_all_user_ids(&self) -> Result<Vec<UserId>, UsersRepositoryError> {
        let mut user_ids: Vec<UserId> = self.users.read().keys().cloned().collect();
        user_ids.sort();
        Ok(user_ids)
    }
}
