use crate::auth::{auth_dto::RegisterRequest, validation::validate_phone};
use crate::error::{AppError, Result};
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    demo_password: Option<String>,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, demo_password: Option<String>) -> Self {
        Self {
            user_repo,
            demo_password,
        }
    }

    /// Validates the phone format and returns the registered user, if any.
    pub async fn lookup_phone(&self, phone: &str) -> Result<Option<User>> {
        if !validate_phone(phone) {
            return Err(AppError::Validation(
                "Phone must be +7 followed by 10 digits".to_string(),
            ));
        }
        Ok(self.user_repo.find_by_phone(phone).await)
    }

    pub async fn login(&self, phone: &str, password: &str) -> Result<User> {
        if password.is_empty() {
            return Err(AppError::Validation("Enter your password".to_string()));
        }

        let user = self
            .user_repo
            .find_by_phone(phone)
            .await
            .ok_or_else(|| AppError::Authentication("No account with this phone".into()))?;

        if let Some(ref expected) = self.demo_password {
            if password != expected.as_str() {
                return Err(AppError::Authentication("Wrong password".into()));
            }
        }

        let user = self.start_session(user.id).await?;
        tracing::info!(user_id = %user.id, "User {} logged in", user.username);
        Ok(user)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let request = request.normalized();
        request.validate()?;

        if self.user_repo.find_by_username(&request.username).await.is_some() {
            return Err(AppError::Conflict("Username is already taken".into()));
        }
        if self.user_repo.find_by_phone(&request.phone).await.is_some() {
            return Err(AppError::Conflict("Phone number is already registered".into()));
        }

        let user = self
            .user_repo
            .create(&request.username, &request.phone, &request.name)
            .await?;
        let user = self.start_session(user.id).await?;

        tracing::info!(user_id = %user.id, "Registered user {}", user.username);
        Ok(user)
    }

    pub async fn logout(&self, user_id: Option<Uuid>) -> Result<()> {
        if let Some(user_id) = user_id {
            self.user_repo.update_status(user_id, false).await;
            tracing::info!(%user_id, "User logged out");
        }
        self.user_repo.set_current_user(None).await?;
        Ok(())
    }

    async fn start_session(&self, user_id: Uuid) -> Result<User> {
        self.user_repo.start_session(user_id).await
    }
}
