use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{MessageModel, MessageRecord};
use crate::db::{database_error, InMemoryStore, Tables};
use crate::shared::AppError;

/// Trait for message persistence
#[async_trait]
pub trait MessageRepository {
    /// Stores the message and adds its author to the room's participants
    /// as one write. Returns whether the author newly joined the room.
    async fn post_message(&self, message: &MessageModel) -> Result<bool, AppError>;
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError>;
    async fn delete_message(&self, message_id: Uuid) -> Result<(), AppError>;

    /// Messages of one room, newest first
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageRecord>, AppError>;
    /// Latest messages across all rooms, newest first
    async fn recent_messages(&self, limit: usize) -> Result<Vec<MessageRecord>, AppError>;
    /// Latest messages written by one user, newest first
    async fn list_user_messages(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, AppError>;
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    store: InMemoryStore,
}

impl InMemoryMessageRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }

    /// Newest first; messages created in the same instant keep reverse
    /// insertion order
    fn collect_records<F>(tables: &Tables, filter: F) -> Vec<MessageRecord>
    where
        F: Fn(&MessageModel) -> bool,
    {
        let mut records: Vec<MessageRecord> = tables
            .messages
            .iter()
            .rev()
            .filter(|message| filter(message))
            .filter_map(|message| tables.message_record(message))
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message), fields(message_id = %message.id, room_id = %message.room_id))]
    async fn post_message(&self, message: &MessageModel) -> Result<bool, AppError> {
        let mut tables = self.store.lock();
        if tables.room(message.room_id).is_none() {
            warn!("Room not found for new message in memory");
            return Err(AppError::NotFound("Room not found".to_string()));
        }
        tables.messages.push(message.clone());
        let joined = tables.join_room(message.room_id, message.user_id);

        debug!(joined, "Message created successfully in memory");
        Ok(joined)
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        let tables = self.store.lock();
        Ok(tables
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, message_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != message_id);

        if tables.messages.len() == before {
            warn!("Message not found for deletion in memory");
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        debug!("Message deleted from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageRecord>, AppError> {
        let tables = self.store.lock();
        Ok(Self::collect_records(&tables, |m| m.room_id == room_id))
    }

    #[instrument(skip(self))]
    async fn recent_messages(&self, limit: usize) -> Result<Vec<MessageRecord>, AppError> {
        let tables = self.store.lock();
        let mut records = Self::collect_records(&tables, |_| true);
        records.truncate(limit);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list_user_messages(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, AppError> {
        let tables = self.store.lock();
        let mut records = Self::collect_records(&tables, |m| m.user_id == user_id);
        records.truncate(limit);
        Ok(records)
    }
}

const MESSAGE_RECORD_SELECT: &str = "SELECT m.id, m.room_id, r.name AS room_name, \
     m.user_id, u.username, m.body, m.created_at \
     FROM messages m JOIN rooms r ON r.id = m.room_id JOIN users u ON u.id = m.user_id";

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message), fields(message_id = %message.id, room_id = %message.room_id))]
    async fn post_message(&self, message: &MessageModel) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            "INSERT INTO messages (id, room_id, user_id, body, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(message.user_id)
        .bind(&message.body)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                warn!("Room not found for new message");
                AppError::NotFound("Room not found".to_string())
            }
            e => database_error(e),
        })?;

        let joined_result = sqlx::query(
            "INSERT INTO room_participants (room_id, user_id, joined_at) VALUES ($1, $2, $3) \
             ON CONFLICT (room_id, user_id) DO NOTHING",
        )
        .bind(message.room_id)
        .bind(message.user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;
        let joined = joined_result.rows_affected() == 1;

        tx.commit().await.map_err(database_error)?;

        debug!(joined, "Message created successfully in database");
        Ok(joined)
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, user_id, body, created_at, updated_at \
             FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, message_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            warn!("Message not found for deletion");
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        debug!("Message deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageRecord>, AppError> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            "{MESSAGE_RECORD_SELECT} WHERE m.room_id = $1 ORDER BY m.created_at DESC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn recent_messages(&self, limit: usize) -> Result<Vec<MessageRecord>, AppError> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            "{MESSAGE_RECORD_SELECT} ORDER BY m.created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_user_messages(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, AppError> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            "{MESSAGE_RECORD_SELECT} WHERE m.user_id = $1 ORDER BY m.created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::{RoomModel, TopicModel};
    use crate::user::models::UserModel;

    struct Fixture {
        repo: InMemoryMessageRepository,
        store: InMemoryStore,
        room: RoomModel,
        other_room: RoomModel,
        alice: UserModel,
        bob: UserModel,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let alice = UserModel::new("alice".to_string(), "hash".to_string());
        let bob = UserModel::new("bob".to_string(), "hash".to_string());
        let topic = TopicModel::new("Music".to_string());
        let room = RoomModel::new(alice.id, topic.id, "Jazz Night".to_string(), String::new());
        let other_room = RoomModel::new(bob.id, topic.id, "Rock Hour".to_string(), String::new());
        {
            let mut tables = store.lock();
            tables.users.push(alice.clone());
            tables.users.push(bob.clone());
            tables.topics.push(topic);
            tables.rooms.push(room.clone());
            tables.rooms.push(other_room.clone());
        }

        Fixture {
            repo: InMemoryMessageRepository::new(store.clone()),
            store,
            room,
            other_room,
            alice,
            bob,
        }
    }

    async fn post(
        repo: &InMemoryMessageRepository,
        room: &RoomModel,
        user: &UserModel,
        body: &str,
    ) -> MessageModel {
        let message = MessageModel::new(room.id, user.id, body.to_string());
        repo.post_message(&message).await.unwrap();
        message
    }

    #[tokio::test]
    async fn test_create_and_get_message() {
        let f = fixture();
        let message = post(&f.repo, &f.room, &f.bob, "hello").await;

        let stored = f.repo.get_message(message.id).await.unwrap().unwrap();
        assert_eq!(stored, message);
        assert!(f.repo.get_message(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_message_in_missing_room() {
        let f = fixture();
        let message = MessageModel::new(Uuid::new_v4(), f.bob.id, "hello".to_string());

        let result = f.repo.post_message(&message).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(f.store.lock().participants.is_empty());
    }

    #[tokio::test]
    async fn test_post_message_joins_author_once() {
        let f = fixture();

        let first = MessageModel::new(f.room.id, f.bob.id, "hello".to_string());
        assert!(f.repo.post_message(&first).await.unwrap());
        let second = MessageModel::new(f.room.id, f.bob.id, "again".to_string());
        assert!(!f.repo.post_message(&second).await.unwrap());

        let tables = f.store.lock();
        assert_eq!(tables.messages.len(), 2);
        assert_eq!(tables.participants, vec![(f.room.id, f.bob.id)]);
    }

    #[tokio::test]
    async fn test_room_messages_newest_first() {
        let f = fixture();
        post(&f.repo, &f.room, &f.bob, "first").await;
        post(&f.repo, &f.room, &f.alice, "second").await;
        post(&f.repo, &f.other_room, &f.bob, "elsewhere").await;

        let bodies: Vec<String> = f
            .repo
            .list_room_messages(f.room.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_recent_messages_limit() {
        let f = fixture();
        for i in 0..7 {
            post(&f.repo, &f.room, &f.bob, &format!("message {i}")).await;
        }

        let recent = f.repo.recent_messages(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].body, "message 6");
        assert_eq!(recent[0].room_name, "Jazz Night");
        assert_eq!(recent[0].username, "bob");
    }

    #[tokio::test]
    async fn test_list_user_messages() {
        let f = fixture();
        post(&f.repo, &f.room, &f.bob, "from bob").await;
        post(&f.repo, &f.room, &f.alice, "from alice").await;
        post(&f.repo, &f.other_room, &f.bob, "bob again").await;

        let messages = f.repo.list_user_messages(f.bob.id, 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.user_id == f.bob.id));
        assert_eq!(messages[0].body, "bob again");
    }

    #[tokio::test]
    async fn test_delete_message() {
        let f = fixture();
        let message = post(&f.repo, &f.room, &f.bob, "bye").await;

        f.repo.delete_message(message.id).await.unwrap();
        assert!(f.repo.get_message(message.id).await.unwrap().is_none());

        let result = f.repo.delete_message(message.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
