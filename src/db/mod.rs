mod memory;

pub use memory::{InMemoryStore, Tables};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, instrument, warn};

use crate::shared::AppError;

/// Logs and wraps a failed query
pub fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Database query failed");
    AppError::DatabaseError(e.to_string())
}

/// Opens a PostgreSQL pool and brings the schema up to date
#[instrument(skip(database_url))]
pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to connect to database");
            AppError::DatabaseError(e.to_string())
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to run database migrations");
            AppError::DatabaseError(e.to_string())
        })?;

    info!("Database connected and migrated");
    Ok(pool)
}
