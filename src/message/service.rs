use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{MessageModel, MessageRecord},
    repository::MessageRepository,
};
use crate::{room::repository::RoomRepository, shared::AppError};

/// Service for posting, listing and deleting messages
pub struct MessageService {
    repository: Arc<dyn MessageRepository + Send + Sync>,
    room_repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository + Send + Sync>,
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            room_repository,
        }
    }

    /// Posts a message and makes the author a participant of the room.
    ///
    /// Returns `None` without touching the store when the body is blank.
    #[instrument(skip(self, body))]
    pub async fn post_message(
        &self,
        room_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Option<MessageModel>, AppError> {
        if self.room_repository.get_room(room_id).await?.is_none() {
            warn!("Message posted to missing room");
            return Err(AppError::NotFound("Room not found".to_string()));
        }

        let body = body.trim();
        if body.is_empty() {
            debug!("Ignoring empty message");
            return Ok(None);
        }

        let message = MessageModel::new(room_id, author_id, body.to_string());
        let joined = self.repository.post_message(&message).await?;

        info!(message_id = %message.id, joined, "Message posted");
        Ok(Some(message))
    }

    #[instrument(skip(self))]
    pub async fn room_messages(&self, room_id: Uuid) -> Result<Vec<MessageRecord>, AppError> {
        self.repository.list_room_messages(room_id).await
    }

    #[instrument(skip(self))]
    pub async fn recent_messages(&self, limit: usize) -> Result<Vec<MessageRecord>, AppError> {
        self.repository.recent_messages(limit).await
    }

    #[instrument(skip(self))]
    pub async fn user_messages(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, AppError> {
        self.repository.list_user_messages(user_id, limit).await
    }

    /// Loads a message the caller is allowed to delete
    #[instrument(skip(self))]
    pub async fn get_own_message(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<MessageModel, AppError> {
        let message = self
            .repository
            .get_message(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

        if !message.is_authored_by(user_id) {
            warn!(author_id = %message.user_id, "Caller is not the message author");
            return Err(AppError::Forbidden);
        }

        Ok(message)
    }

    /// Deletes one message; only its author may do so
    #[instrument(skip(self))]
    pub async fn delete_message(&self, message_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let message = self.get_own_message(message_id, user_id).await?;
        self.repository.delete_message(message.id).await?;

        info!(room_id = %message.room_id, "Message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::message::repository::InMemoryMessageRepository;
    use crate::room::models::RoomModel;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::user::models::UserModel;

    struct Fixture {
        service: MessageService,
        rooms: Arc<InMemoryRoomRepository>,
        room: RoomModel,
        alice: UserModel,
        bob: UserModel,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let alice = UserModel::new("alice".to_string(), "hash".to_string());
        let bob = UserModel::new("bob".to_string(), "hash".to_string());
        {
            let mut tables = store.lock();
            tables.users.push(alice.clone());
            tables.users.push(bob.clone());
        }

        let rooms = Arc::new(InMemoryRoomRepository::new(store.clone()));
        let topic = rooms.get_or_create_topic("Music").await.unwrap();
        let room = RoomModel::new(alice.id, topic.id, "Jazz Night".to_string(), String::new());
        rooms.create_room(&room).await.unwrap();

        Fixture {
            service: MessageService::new(
                Arc::new(InMemoryMessageRepository::new(store)),
                rooms.clone(),
            ),
            rooms,
            room,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_post_message_adds_participant() {
        let f = fixture().await;

        let message = f
            .service
            .post_message(f.room.id, f.bob.id, "  hi there  ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.body, "hi there");

        f.service
            .post_message(f.room.id, f.bob.id, "again")
            .await
            .unwrap();

        let participants = f.rooms.list_participants(f.room.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].username, "bob");
        assert_eq!(f.service.room_messages(f.room.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_message_is_ignored() {
        let f = fixture().await;

        let posted = f
            .service
            .post_message(f.room.id, f.bob.id, "   ")
            .await
            .unwrap();
        assert!(posted.is_none());

        assert!(f.service.room_messages(f.room.id).await.unwrap().is_empty());
        assert!(f.rooms.list_participants(f.room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_to_missing_room() {
        let f = fixture().await;
        let result = f.service.post_message(Uuid::new_v4(), f.bob.id, "hi").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_only_author_can_delete() {
        let f = fixture().await;
        let message = f
            .service
            .post_message(f.room.id, f.bob.id, "mine")
            .await
            .unwrap()
            .unwrap();

        let result = f.service.delete_message(message.id, f.alice.id).await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        f.service.delete_message(message.id, f.bob.id).await.unwrap();
        assert!(f.service.room_messages(f.room.id).await.unwrap().is_empty());

        // Participation outlives the message
        assert_eq!(f.rooms.list_participants(f.room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_message() {
        let f = fixture().await;
        let result = f.service.delete_message(Uuid::new_v4(), f.bob.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
