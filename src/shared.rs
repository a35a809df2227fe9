use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::InMemoryStore;
use crate::message::repository::{
    InMemoryMessageRepository, MessageRepository, PostgresMessageRepository,
};
use crate::room::repository::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository};
use crate::session::repository::{
    InMemorySessionRepository, PostgresSessionRepository, SessionRepository,
};
use crate::session::token::TokenConfig;
use crate::user::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub message_repository: Arc<dyn MessageRepository + Send + Sync>,
    pub session_repository: Arc<dyn SessionRepository + Send + Sync>,
    pub token_config: TokenConfig,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            user_repository,
            room_repository,
            message_repository,
            session_repository,
            token_config,
            bcrypt_cost,
        }
    }

    /// Wires every repository to one shared in-memory store.
    /// Data is lost when the process exits.
    pub fn in_memory(config: &AppConfig) -> Self {
        let store = InMemoryStore::new();

        Self::new(
            Arc::new(InMemoryUserRepository::new(store.clone())),
            Arc::new(InMemoryRoomRepository::new(store.clone())),
            Arc::new(InMemoryMessageRepository::new(store.clone())),
            Arc::new(InMemorySessionRepository::new(store)),
            TokenConfig::from_config(config),
            config.bcrypt_cost,
        )
    }

    /// Wires every repository to the same PostgreSQL pool.
    pub fn postgres(pool: PgPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresRoomRepository::new(pool.clone())),
            Arc::new(PostgresMessageRepository::new(pool.clone())),
            Arc::new(PostgresSessionRepository::new(pool)),
            TokenConfig::from_config(config),
            config.bcrypt_cost,
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            // Ownership failures are a bare text rejection, not a JSON error page
            AppError::Forbidden => return (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}
