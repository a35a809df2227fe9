// Public API - what other modules can use
pub use cleanup_task::start_cleanup_task;
pub use middleware::{
    cleared_session_cookie, resolve_session, session_cookie, LOGIN_PATH, SESSION_COOKIE,
};
pub use service::SessionService;
pub use types::{CurrentUser, SessionClaims, SessionContext};

// Internal modules
mod cleanup_task;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
mod types;
