use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    models::SessionModel,
    repository::SessionRepository,
    token::TokenConfig,
    types::SessionClaims,
};
use crate::shared::AppError;

/// Service for handling session business logic
pub struct SessionService {
    token_config: TokenConfig,
    repository: Arc<dyn SessionRepository + Send + Sync>,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            token_config,
            repository,
        }
    }

    /// Stores a new session for the user and returns its signed token
    #[instrument(skip(self))]
    pub async fn start_session(&self, user_id: Uuid, username: &str) -> Result<String, AppError> {
        let session = SessionModel::new(
            user_id,
            username.to_string(),
            self.token_config.expiration_days,
        );
        self.repository.create_session(&session).await?;

        let token = self.token_config.create_token(
            session.id.clone(),
            user_id,
            username.to_string(),
        )?;

        info!(session_id = %session.id, username = %username, "Session started");
        Ok(token)
    }

    /// Validates a session token and returns the claims if valid.
    /// A valid session has its `last_accessed` moved to now.
    #[instrument(skip(self, token))]
    pub async fn validate_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        // First validate JWT token structure and signature
        let claims = self.token_config.validate_token(token)?;

        // Then validate session exists in the store and hasn't been revoked
        match self.repository.get_session(&claims.session_id).await? {
            Some(session_model) => {
                if session_model.is_expired() {
                    warn!(
                        session_id = %claims.session_id,
                        "Session found in store but has expired"
                    );
                    return Err(AppError::Unauthorized("Session has expired".to_string()));
                }

                if session_model.user_id != claims.user_id {
                    warn!(
                        session_id = %claims.session_id,
                        "Token names a session owned by another user"
                    );
                    return Err(AppError::Unauthorized("Session mismatch".to_string()));
                }

                match self
                    .repository
                    .touch_session(&claims.session_id, Utc::now())
                    .await
                {
                    Ok(()) => Ok(claims),
                    // Revoked between the lookup and the touch
                    Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(
                        "Session not found or has been revoked".to_string(),
                    )),
                    Err(e) => Err(e),
                }
            }
            None => {
                warn!(
                    session_id = %claims.session_id,
                    "Session not found in store - may have been revoked"
                );
                Err(AppError::Unauthorized(
                    "Session not found or has been revoked".to_string(),
                ))
            }
        }
    }

    /// Revokes a session by removing it from the store
    #[instrument(skip(self))]
    pub async fn revoke_session(&self, session_id: &str) -> Result<(), AppError> {
        self.repository.delete_session(session_id).await?;
        info!(session_id = %session_id, "Session revoked successfully");
        Ok(())
    }

    /// Cleans up expired sessions from the store
    #[instrument(skip(self))]
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let removed_count = self.repository.cleanup_expired_sessions().await?;

        info!(
            removed_sessions = removed_count,
            "Expired sessions cleanup completed"
        );
        Ok(removed_count)
    }
}
