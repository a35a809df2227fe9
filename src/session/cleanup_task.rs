use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::repository::SessionRepository;

/// Starts the background task that periodically removes expired sessions
#[instrument(skip(session_repository))]
pub async fn start_cleanup_task(
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
    cleanup_interval: Duration,
) {
    info!(
        cleanup_interval_secs = cleanup_interval.as_secs(),
        "Starting session cleanup background task"
    );

    let mut ticker = interval(cleanup_interval);

    loop {
        ticker.tick().await;

        match session_repository.cleanup_expired_sessions().await {
            Ok(0) => {}
            Ok(removed) => info!(removed_sessions = removed, "Session cleanup completed"),
            Err(e) => error!(error = %e, "Session cleanup failed"),
        }
    }
}
