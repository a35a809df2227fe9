// Public API - what other modules can use
pub use handlers::{
    create_room, create_room_page, delete_room, delete_room_page, get_room, list_rooms,
    update_room, update_room_page,
};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
