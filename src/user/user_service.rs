use crate::{
    error::{AppError, Result},
    user::{user_models::User, user_repository::UserRepository},
};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
}

impl UserService {
    pub fn new(user_repository: UserRepository) -> Self {
        Self { user_repository }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repository
            .find_by_id(user_id)
            .await
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Contact search for the sidebar; the logged-in user never shows up in results.
    pub async fn search_contacts(&self, query: &str) -> Vec<User> {
        let current = self.user_repository.current_user_id().await;
        let results = self.user_repository.search(query, current).await;
        tracing::debug!(query, matches = results.len(), "contact search");
        results
    }
}
