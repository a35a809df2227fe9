use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    service::RoomService,
    types::{
        room_form_values, ConfirmDeleteView, HomeView, ListRoomsQuery, RoomDetailView, RoomForm,
        RoomFormPage, RoomFormView, TopicResponse, RECENT_MESSAGE_LIMIT,
    },
};
use crate::message::service::MessageService;
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};

fn room_service(state: &AppState) -> RoomService {
    RoomService::new(Arc::clone(&state.room_repository))
}

fn message_service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.message_repository),
        Arc::clone(&state.room_repository),
    )
}

async fn topic_list(service: &RoomService) -> Result<Vec<TopicResponse>, AppError> {
    Ok(service
        .list_topics()
        .await?
        .into_iter()
        .map(TopicResponse::from)
        .collect())
}

/// HTTP handler for the room listing
///
/// GET /?q=<query>
/// Returns matching rooms, every topic and the latest messages platform-wide
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<HomeView>, AppError> {
    let service = room_service(&state);
    let rooms = service.list_rooms(query.q.as_deref()).await?;
    let topics = topic_list(&service).await?;
    let room_messages = message_service(&state)
        .recent_messages(RECENT_MESSAGE_LIMIT)
        .await?;

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Ok(Json(HomeView {
        room_count: rooms.len(),
        rooms: rooms.into_iter().map(Into::into).collect(),
        topics,
        room_messages: room_messages.into_iter().map(Into::into).collect(),
    }))
}

/// HTTP handler for a room's conversation
///
/// GET /room/:id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomDetailView>, AppError> {
    let service = room_service(&state);
    let room = service.get_room(room_id).await?;
    let room_messages = message_service(&state).room_messages(room_id).await?;
    let participants = service.participants(room_id).await?;

    Ok(Json(RoomDetailView {
        room: room.into(),
        room_messages: room_messages.into_iter().map(Into::into).collect(),
        participants: participants.into_iter().map(Into::into).collect(),
    }))
}

/// GET /create-room/
#[instrument(name = "create_room_page", skip(state, user), fields(user_id = %user.user_id))]
pub async fn create_room_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<RoomFormView>, AppError> {
    let topics = topic_list(&room_service(&state)).await?;

    Ok(Json(RoomFormView {
        page: RoomFormPage::Create,
        topics,
        form: None,
    }))
}

/// HTTP handler for creating a new room hosted by the caller
///
/// POST /create-room/
#[instrument(name = "create_room", skip(state, user, form), fields(user_id = %user.user_id))]
pub async fn create_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<RoomForm>,
) -> Result<Redirect, AppError> {
    let room = room_service(&state).create_room(user.user_id, form).await?;

    info!(room_id = %room.id, "Room created successfully");
    Ok(Redirect::to("/"))
}

/// GET /update-room/:id/
/// Host only; returns the form prefilled with the room's current values
#[instrument(name = "update_room_page", skip(state, user), fields(user_id = %user.user_id))]
pub async fn update_room_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomFormView>, AppError> {
    let service = room_service(&state);
    let (room, topic_name) = service.get_hosted_room(room_id, user.user_id).await?;
    let topics = topic_list(&service).await?;

    Ok(Json(RoomFormView {
        page: RoomFormPage::Update,
        topics,
        form: Some(room_form_values(&room, topic_name)),
    }))
}

/// POST /update-room/:id/
#[instrument(name = "update_room", skip(state, user, form), fields(user_id = %user.user_id))]
pub async fn update_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(room_id): Path<Uuid>,
    Form(form): Form<RoomForm>,
) -> Result<Redirect, AppError> {
    room_service(&state)
        .update_room(room_id, user.user_id, form)
        .await?;

    Ok(Redirect::to("/"))
}

/// GET /delete-room/:id/
#[instrument(name = "delete_room_page", skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_room_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<ConfirmDeleteView>, AppError> {
    let (room, _) = room_service(&state)
        .get_hosted_room(room_id, user.user_id)
        .await?;

    Ok(Json(ConfirmDeleteView { object: room.name }))
}

/// POST /delete-room/:id/
/// Removes the room with its messages and participants
#[instrument(name = "delete_room", skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(room_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    room_service(&state)
        .delete_room(room_id, user.user_id)
        .await?;

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::repository::RoomRepository;
    use crate::router::build_router;
    use crate::shared::test_utils::{
        body_json, get, location, post_form, signed_in_user, test_state,
    };
    use axum::http::StatusCode;
    use tower::ServiceExt; // for `oneshot`

    async fn create_jazz_room(state: &AppState, token: &str) -> Uuid {
        let response = build_router(state.clone())
            .oneshot(post_form(
                "/create-room/",
                Some(token),
                "topic=Music&name=Jazz+Night&description=weekly+jam",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let rooms = state.room_repository.search_rooms(None).await.unwrap();
        rooms[0].id
    }

    #[tokio::test]
    async fn test_create_room_handler() {
        let state = test_state();
        let (alice, token) = signed_in_user(&state, "alice").await;

        let room_id = create_jazz_room(&state, &token).await;

        let response = build_router(state.clone())
            .oneshot(get(&format!("/room/{room_id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let view: RoomDetailView = body_json(response).await;
        assert_eq!(view.room.name, "Jazz Night");
        assert_eq!(view.room.topic, "Music");
        assert_eq!(view.room.host_id, alice.id);
        assert!(view.room_messages.is_empty());
        assert!(view.participants.is_empty());
    }

    #[tokio::test]
    async fn test_create_room_requires_login() {
        let state = test_state();

        let response = build_router(state.clone())
            .oneshot(post_form("/create-room/", None, "topic=Music&name=Jazz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/");

        let page = build_router(state.clone())
            .oneshot(get("/create-room/", None))
            .await
            .unwrap();
        assert_eq!(location(&page), "/login/");

        assert!(state.room_repository.search_rooms(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_room_missing_name() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "alice").await;

        let response = build_router(state)
            .oneshot(post_form("/create-room/", Some(&token), "topic=Music&name=+"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: serde_json::Value = body_json(response).await;
        assert_eq!(error["error"], "Name is required");
    }

    #[tokio::test]
    async fn test_create_room_page_lists_topics() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "alice").await;
        create_jazz_room(&state, &token).await;

        let response = build_router(state)
            .oneshot(get("/create-room/", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let view: RoomFormView = body_json(response).await;
        assert_eq!(view.page, RoomFormPage::Create);
        assert_eq!(view.topics.len(), 1);
        assert!(view.form.is_none());
    }

    #[tokio::test]
    async fn test_list_rooms_handler_search() {
        let state = test_state();
        let (_, token) = signed_in_user(&state, "alice").await;
        create_jazz_room(&state, &token).await;

        let response = build_router(state.clone())
            .oneshot(get("/?q=jazz", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: HomeView = body_json(response).await;
        assert_eq!(view.room_count, 1);
        assert_eq!(view.rooms[0].name, "Jazz Night");
        assert_eq!(view.topics[0].name, "Music");

        let response = build_router(state)
            .oneshot(get("/?q=rock", None))
            .await
            .unwrap();
        let view: HomeView = body_json(response).await;
        assert_eq!(view.room_count, 0);
        assert!(view.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_room() {
        let state = test_state();
        let response = build_router(state)
            .oneshot(get(&format!("/room/{}", Uuid::new_v4()), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_room_host_only() {
        let state = test_state();
        let (_, alice_token) = signed_in_user(&state, "alice").await;
        let (_, bob_token) = signed_in_user(&state, "bob").await;
        let room_id = create_jazz_room(&state, &alice_token).await;
        let uri = format!("/update-room/{room_id}/");

        let forbidden = build_router(state.clone())
            .oneshot(post_form(&uri, Some(&bob_token), "topic=Music&name=Bob+Room"))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let forbidden_page = build_router(state.clone())
            .oneshot(get(&uri, Some(&bob_token)))
            .await
            .unwrap();
        assert_eq!(forbidden_page.status(), StatusCode::FORBIDDEN);

        let page = build_router(state.clone())
            .oneshot(get(&uri, Some(&alice_token)))
            .await
            .unwrap();
        let view: RoomFormView = body_json(page).await;
        assert_eq!(view.page, RoomFormPage::Update);
        assert_eq!(view.form.unwrap().name, "Jazz Night");

        let updated = build_router(state.clone())
            .oneshot(post_form(
                &uri,
                Some(&alice_token),
                "topic=Music&name=Jazz+Morning&description=",
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::SEE_OTHER);

        let room = state.room_repository.get_room(room_id).await.unwrap().unwrap();
        assert_eq!(room.name, "Jazz Morning");
        assert_eq!(room.description, "");
    }

    #[tokio::test]
    async fn test_delete_room_confirm_then_delete() {
        let state = test_state();
        let (_, alice_token) = signed_in_user(&state, "alice").await;
        let (_, bob_token) = signed_in_user(&state, "bob").await;
        let room_id = create_jazz_room(&state, &alice_token).await;
        let uri = format!("/delete-room/{room_id}/");

        let confirm = build_router(state.clone())
            .oneshot(get(&uri, Some(&alice_token)))
            .await
            .unwrap();
        let view: ConfirmDeleteView = body_json(confirm).await;
        assert_eq!(view.object, "Jazz Night");

        let forbidden = build_router(state.clone())
            .oneshot(post_form(&uri, Some(&bob_token), ""))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let deleted = build_router(state.clone())
            .oneshot(post_form(&uri, Some(&alice_token), ""))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
        assert!(state.room_repository.get_room(room_id).await.unwrap().is_none());

        let missing = build_router(state)
            .oneshot(post_form(&uri, Some(&alice_token), ""))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
