use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{ParticipantRecord, RoomModel, RoomRecord, TopicModel},
    repository::RoomRepository,
    types::RoomForm,
};
use crate::shared::AppError;

/// Service for handling room business logic
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Lists rooms, narrowed by `query` when it is non-empty.
    /// The query is matched as given, surrounding whitespace included.
    #[instrument(skip(self))]
    pub async fn list_rooms(&self, query: Option<&str>) -> Result<Vec<RoomRecord>, AppError> {
        let query = query.filter(|q| !q.is_empty());
        let rooms = self.repository.search_rooms(query).await?;

        debug!(room_count = rooms.len(), "Rooms listed");
        Ok(rooms)
    }

    #[instrument(skip(self))]
    pub async fn list_topics(&self) -> Result<Vec<TopicModel>, AppError> {
        self.repository.list_topics().await
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: Uuid) -> Result<RoomRecord, AppError> {
        self.repository
            .get_room_record(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn participants(&self, room_id: Uuid) -> Result<Vec<ParticipantRecord>, AppError> {
        self.repository.list_participants(room_id).await
    }

    #[instrument(skip(self))]
    pub async fn rooms_hosted_by(&self, host_id: Uuid) -> Result<Vec<RoomRecord>, AppError> {
        self.repository.list_rooms_by_host(host_id).await
    }

    /// Creates a room hosted by the caller; the topic is created on first use
    #[instrument(skip(self, form))]
    pub async fn create_room(&self, host_id: Uuid, form: RoomForm) -> Result<RoomModel, AppError> {
        let form = form.validate()?;
        let topic = self.repository.get_or_create_topic(&form.topic).await?;

        let room = RoomModel::new(host_id, topic.id, form.name, form.description);
        self.repository.create_room(&room).await?;

        info!(room_id = %room.id, topic = %topic.name, "Room created");
        Ok(room)
    }

    /// Loads a room together with its topic name, for a caller that must be its host
    #[instrument(skip(self))]
    pub async fn get_hosted_room(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<(RoomModel, String), AppError> {
        let room = self
            .repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

        if !room.is_hosted_by(user_id) {
            warn!(host_id = %room.host_id, "Caller is not the room host");
            return Err(AppError::Forbidden);
        }

        let topic_name = self
            .repository
            .get_topic(room.topic_id)
            .await?
            .map(|topic| topic.name)
            .unwrap_or_default();

        Ok((room, topic_name))
    }

    /// Replaces topic, name and description; host only
    #[instrument(skip(self, form))]
    pub async fn update_room(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        form: RoomForm,
    ) -> Result<RoomModel, AppError> {
        let (mut room, _) = self.get_hosted_room(room_id, user_id).await?;
        let form = form.validate()?;
        let topic = self.repository.get_or_create_topic(&form.topic).await?;

        room.topic_id = topic.id;
        room.name = form.name;
        room.description = form.description;
        room.updated_at = Utc::now();
        self.repository.update_room(&room).await?;

        info!(room_id = %room.id, "Room updated");
        Ok(room)
    }

    /// Deletes a room with all its messages; host only
    #[instrument(skip(self))]
    pub async fn delete_room(&self, room_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let (room, _) = self.get_hosted_room(room_id, user_id).await?;
        let removed_messages = self.repository.delete_room(room.id).await?;

        info!(room_id = %room.id, removed_messages, "Room deleted");
        Ok(())
    }
}
