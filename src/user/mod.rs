// Public API - what other modules can use
pub use handlers::{get_profile, login, login_page, logout, register, register_page};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
