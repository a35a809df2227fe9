// Public API - what other modules can use
pub use handlers::{delete_message, delete_message_page, post_message};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
