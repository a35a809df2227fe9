// Library crate for the agora forum server
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod db;
pub mod message;
pub mod room;
pub mod router;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use router::build_router;
pub use shared::{AppError, AppState};
