use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::UserModel,
    repository::{UserRepository, USERNAME_TAKEN},
    types::{normalize_username, LoginForm, RegisterForm},
};
use crate::shared::AppError;

/// Single message for every login failure, whether or not the username exists
pub const INVALID_CREDENTIALS: &str = "Username or password is incorrect";

/// Service for registration, credential checks and user lookup
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>, bcrypt_cost: u32) -> Self {
        Self {
            repository,
            bcrypt_cost,
        }
    }

    /// Validates the form and creates the user with a hashed password
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: RegisterForm) -> Result<UserModel, AppError> {
        let new_user = form.validate()?;

        if self
            .repository
            .get_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            warn!("Registration for an existing username");
            return Err(AppError::Validation(USERNAME_TAKEN.to_string()));
        }

        let password_hash = bcrypt::hash(&new_user.password, self.bcrypt_cost).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            AppError::Internal
        })?;

        let user = UserModel::new(new_user.username, password_hash);
        self.repository.create_user(&user).await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks a username/password pair; the username is matched case-insensitively
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn authenticate(&self, form: LoginForm) -> Result<UserModel, AppError> {
        let username = normalize_username(&form.username);

        let Some(user) = self.repository.get_user_by_username(&username).await? else {
            warn!("Login for unknown username");
            // Costs as much bcrypt work as checking a stored hash
            let _ = bcrypt::hash(&form.password, self.bcrypt_cost);
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        let matches = bcrypt::verify(&form.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password hash");
            AppError::Internal
        })?;

        if !matches {
            warn!("Login with wrong password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserModel, AppError> {
        self.repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
