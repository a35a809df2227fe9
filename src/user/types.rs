use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::UserModel;
use crate::message::types::MessageResponse;
use crate::room::types::{RoomResponse, TopicResponse};
use crate::shared::AppError;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Characters allowed in a username besides letters and digits
const USERNAME_SYMBOLS: &str = "@.+-_";

/// Login form submission
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form submission
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

/// A registration that passed validation; username already lowercased
#[derive(Debug, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let username = normalize_username(&self.username);

        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::Validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || USERNAME_SYMBOLS.contains(c))
        {
            return Err(AppError::Validation(
                "Username may contain only letters, digits and @/./+/-/_".to_string(),
            ));
        }
        if self.password1 != self.password2 {
            return Err(AppError::Validation(
                "The two password fields didn't match".to_string(),
            ));
        }
        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        Ok(NewUser {
            username,
            password: self.password1,
        })
    }
}

/// Usernames are compared and stored lowercased
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Which credential form a view renders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthPage {
    Login,
    Register,
}

/// View for the login and registration forms
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthPageView {
    pub page: AuthPage,
}

/// Public representation of a user; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub joined: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            joined: user.created_at,
        }
    }
}

/// View for a user's profile page
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileView {
    pub user: UserResponse,
    pub rooms: Vec<RoomResponse>,
    pub room_messages: Vec<MessageResponse>,
    pub topics: Vec<TopicResponse>,
}
