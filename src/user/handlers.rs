use axum::{
    extract::{Path, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::UserModel,
    service::UserService,
    types::{AuthPage, AuthPageView, LoginForm, ProfileView, RegisterForm},
};
use crate::message::service::MessageService;
use crate::room::{
    service::RoomService,
    types::{TopicResponse, RECENT_MESSAGE_LIMIT},
};
use crate::session::{
    cleared_session_cookie, session_cookie, CurrentUser, SessionContext, SessionService,
};
use crate::shared::{AppError, AppState};

fn user_service(state: &AppState) -> UserService {
    UserService::new(Arc::clone(&state.user_repository), state.bcrypt_cost)
}

fn session_service(state: &AppState) -> SessionService {
    SessionService::new(
        Arc::clone(&state.session_repository),
        state.token_config.clone(),
    )
}

/// Opens a session for the user and redirects to the listing with the cookie set
async fn signed_in_redirect(state: &AppState, user: &UserModel) -> Result<Response, AppError> {
    let token = session_service(state)
        .start_session(user.id, &user.username)
        .await?;
    let cookie = session_cookie(&token, state.token_config.expiration_days);

    Ok(([(SET_COOKIE, cookie.to_string())], Redirect::to("/")).into_response())
}

fn auth_page(session: &SessionContext, page: AuthPage) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Json(AuthPageView { page }).into_response()
}

/// GET /login/
#[instrument(name = "login_page", skip(session))]
pub async fn login_page(session: SessionContext) -> Response {
    auth_page(&session, AuthPage::Login)
}

/// GET /register/
#[instrument(name = "register_page", skip(session))]
pub async fn register_page(session: SessionContext) -> Response {
    auth_page(&session, AuthPage::Register)
}

/// HTTP handler for logging in
///
/// POST /login/
/// Sets the session cookie and redirects to the listing
#[instrument(name = "login", skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if session.is_authenticated() {
        debug!("Already logged in");
        return Ok(Redirect::to("/").into_response());
    }

    let user = user_service(&state).authenticate(form).await?;

    info!(user_id = %user.id, "User logged in");
    signed_in_redirect(&state, &user).await
}

/// HTTP handler for registration
///
/// POST /register/
/// Creates the account and logs the new user in
#[instrument(name = "register", skip(state, session, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if session.is_authenticated() {
        debug!("Already logged in");
        return Ok(Redirect::to("/").into_response());
    }

    let user = user_service(&state).register(form).await?;
    signed_in_redirect(&state, &user).await
}

/// GET or POST /logout/
/// Succeeds for anonymous callers too
#[instrument(name = "logout", skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Response, AppError> {
    if let Some(user) = session.user {
        match session_service(&state).revoke_session(&user.session_id).await {
            Ok(()) => info!(user_id = %user.user_id, "User logged out"),
            // Already removed, e.g. by the cleanup task
            Err(AppError::NotFound(_)) => debug!("Session already gone"),
            Err(e) => return Err(e),
        }
    }

    Ok((
        [(SET_COOKIE, cleared_session_cookie().to_string())],
        Redirect::to("/"),
    )
        .into_response())
}

/// HTTP handler for a user's profile
///
/// GET /profile/:id
/// Returns the user with the rooms they host and their latest messages
#[instrument(name = "get_profile", skip(state, viewer), fields(viewer_id = %viewer.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    let user = user_service(&state).get_user(user_id).await?;

    let room_service = RoomService::new(Arc::clone(&state.room_repository));
    let rooms = room_service.rooms_hosted_by(user.id).await?;
    let topics = room_service.list_topics().await?;
    let room_messages = MessageService::new(
        Arc::clone(&state.message_repository),
        Arc::clone(&state.room_repository),
    )
    .user_messages(user.id, RECENT_MESSAGE_LIMIT)
    .await?;

    Ok(Json(ProfileView {
        user: user.into(),
        rooms: rooms.into_iter().map(Into::into).collect(),
        room_messages: room_messages.into_iter().map(Into::into).collect(),
        topics: topics.into_iter().map(TopicResponse::from).collect(),
    }))
}
