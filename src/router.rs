use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{message, room, session, shared::AppState, user};

/// Builds the forum router with session resolution and request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(room::list_rooms))
        .route("/login/", get(user::login_page).post(user::login))
        .route("/register/", get(user::register_page).post(user::register))
        .route("/logout/", get(user::logout).post(user::logout))
        .route("/profile/:id", get(user::get_profile))
        .route("/room/:id", get(room::get_room).post(message::post_message))
        .route(
            "/create-room/",
            get(room::create_room_page).post(room::create_room),
        )
        .route(
            "/update-room/:id/",
            get(room::update_room_page).post(room::update_room),
        )
        .route(
            "/delete-room/:id/",
            get(room::delete_room_page).post(room::delete_room),
        )
        .route(
            "/delete-message/:id/",
            get(message::delete_message_page).post(message::delete_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::resolve_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
