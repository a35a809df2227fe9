use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{service::MessageService, types::MessageForm};
use crate::room::types::ConfirmDeleteView;
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};

fn message_service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.message_repository),
        Arc::clone(&state.room_repository),
    )
}

/// HTTP handler for posting into a room
///
/// POST /room/:id
/// Blank messages are dropped; either way the caller is sent back to the room
#[instrument(name = "post_message", skip(state, user, form), fields(user_id = %user.user_id))]
pub async fn post_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    user: CurrentUser,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    match message_service(&state)
        .post_message(room_id, user.user_id, &form.body)
        .await?
    {
        Some(message) => info!(message_id = %message.id, "Message posted successfully"),
        None => debug!("Empty message not stored"),
    }

    Ok(Redirect::to(&format!("/room/{room_id}")))
}

/// GET /delete-message/:id/
/// Author only; confirmation view naming the message body
#[instrument(name = "delete_message_page", skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_message_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<ConfirmDeleteView>, AppError> {
    let message = message_service(&state)
        .get_own_message(message_id, user.user_id)
        .await?;

    Ok(Json(ConfirmDeleteView {
        object: message.body,
    }))
}

/// POST /delete-message/:id/
#[instrument(name = "delete_message", skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(message_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    message_service(&state)
        .delete_message(message_id, user.user_id)
        .await?;

    Ok(Redirect::to("/"))
}
