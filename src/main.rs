use agora::{build_router, db, session, AppConfig, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting agora forum server");

    let config = AppConfig::from_env()?;

    // PostgreSQL when DATABASE_URL is set, otherwise everything lives in memory
    let app_state = match &config.database_url {
        Some(url) => {
            let pool = db::connect_postgres(url).await?;
            AppState::postgres(pool, &config)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");
            AppState::in_memory(&config)
        }
    };

    tokio::spawn(session::start_cleanup_task(
        Arc::clone(&app_state.session_repository),
        config.session_cleanup_interval,
    ));

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
