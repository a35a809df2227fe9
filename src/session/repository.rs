use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::db::{database_error, InMemoryStore};
use crate::shared::AppError;

/// Trait for login session persistence
#[async_trait]
pub trait SessionRepository {
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError>;
    /// Records that a request presented the session at `at`
    async fn touch_session(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
    /// Removes every session past its expiry and returns how many went
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of SessionRepository, backed by the shared store
pub struct InMemorySessionRepository {
    store: InMemoryStore,
}

impl InMemorySessionRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id, user_id = %session.user_id))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        if tables.sessions.iter().any(|s| s.id == session.id) {
            warn!("Session already exists in memory");
            return Err(AppError::DatabaseError(
                "Session already exists".to_string(),
            ));
        }
        tables.sessions.push(session.clone());

        debug!("Session created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        let tables = self.store.lock();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn touch_session(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == session_id) else {
            warn!("Session not found to touch in memory");
            return Err(AppError::NotFound("Session not found".to_string()));
        };
        session.last_accessed = at;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.id != session_id);

        if tables.sessions.len() == before {
            warn!("Session not found for deletion in memory");
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        debug!("Session deleted from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut tables = self.store.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.expires_at > now);

        let removed = (before - tables.sessions.len()) as u64;
        debug!(expired_sessions_removed = removed, "Expired sessions removed from memory");
        Ok(removed)
    }
}

/// PostgreSQL implementation of session repository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id, user_id = %session.user_id))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, username, created_at, expires_at, last_accessed) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_accessed)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!("Session created in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        sqlx::query_as::<_, SessionModel>(
            "SELECT id, user_id, username, created_at, expires_at, last_accessed \
             FROM user_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn touch_session(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE user_sessions SET last_accessed = $2 WHERE id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            warn!("Session not found to touch");
            return Err(AppError::NotFound("Session not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            warn!("Session not found for deletion");
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        debug!("Session deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        let removed = result.rows_affected();
        debug!(expired_sessions_removed = removed, "Expired sessions removed from database");
        Ok(removed)
    }
}
