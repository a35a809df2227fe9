use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::models::{ParticipantRecord, RoomModel, RoomRecord, TopicModel};
use crate::db::{database_error, InMemoryStore};
use crate::shared::AppError;

/// Trait for room, topic and participant persistence
#[async_trait]
pub trait RoomRepository {
    /// Looks a topic up by exact name, creating it when missing
    async fn get_or_create_topic(&self, name: &str) -> Result<TopicModel, AppError>;
    async fn get_topic(&self, topic_id: Uuid) -> Result<Option<TopicModel>, AppError>;
    async fn list_topics(&self) -> Result<Vec<TopicModel>, AppError>;

    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError>;
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError>;
    async fn get_room_record(&self, room_id: Uuid) -> Result<Option<RoomRecord>, AppError>;
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError>;

    /// Atomically deletes a room with its messages and participant rows.
    /// Returns how many messages were removed.
    async fn delete_room(&self, room_id: Uuid) -> Result<u64, AppError>;

    /// All rooms when `query` is `None`, otherwise rooms whose topic, name,
    /// description or host username contains it (case-insensitive).
    /// Most recently updated first.
    async fn search_rooms(&self, query: Option<&str>) -> Result<Vec<RoomRecord>, AppError>;
    async fn list_rooms_by_host(&self, host_id: Uuid) -> Result<Vec<RoomRecord>, AppError>;

    /// Returns true when the user was not a participant before
    async fn list_participants(&self, room_id: Uuid) -> Result<Vec<ParticipantRecord>, AppError>;
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    store: InMemoryStore,
}

impl InMemoryRoomRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }

    /// Collects matching rooms newest first; ties keep reverse insertion order
    fn collect_records<F>(&self, filter: F) -> Vec<RoomRecord>
    where
        F: Fn(&RoomRecord) -> bool,
    {
        let tables = self.store.lock();
        let mut records: Vec<RoomRecord> = tables
            .rooms
            .iter()
            .rev()
            .filter_map(|room| tables.room_record(room))
            .filter(|record| filter(record))
            .collect();

        records.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        records
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn get_or_create_topic(&self, name: &str) -> Result<TopicModel, AppError> {
        let mut tables = self.store.lock();
        if let Some(topic) = tables.topics.iter().find(|t| t.name == name) {
            return Ok(topic.clone());
        }

        let topic = TopicModel::new(name.to_string());
        tables.topics.push(topic.clone());
        debug!(topic_id = %topic.id, "Topic created in memory");
        Ok(topic)
    }

    #[instrument(skip(self))]
    async fn get_topic(&self, topic_id: Uuid) -> Result<Option<TopicModel>, AppError> {
        Ok(self.store.lock().topic(topic_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_topics(&self) -> Result<Vec<TopicModel>, AppError> {
        let mut topics = self.store.lock().topics.clone();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        if tables.room(room.id).is_some() {
            warn!("Room already exists in memory");
            return Err(AppError::DatabaseError("Room already exists".to_string()));
        }
        tables.rooms.push(room.clone());

        debug!("Room created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        Ok(self.store.lock().room(room_id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_room_record(&self, room_id: Uuid) -> Result<Option<RoomRecord>, AppError> {
        let tables = self.store.lock();
        Ok(tables
            .room(room_id)
            .and_then(|room| tables.room_record(room)))
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let mut tables = self.store.lock();
        let Some(existing) = tables.rooms.iter_mut().find(|r| r.id == room.id) else {
            warn!("Room not found for update in memory");
            return Err(AppError::NotFound("Room not found".to_string()));
        };
        *existing = room.clone();

        debug!("Room updated successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.store.lock();
        if tables.room(room_id).is_none() {
            warn!("Room not found for deletion in memory");
            return Err(AppError::NotFound("Room not found".to_string()));
        }

        let before = tables.messages.len();
        tables.messages.retain(|m| m.room_id != room_id);
        let removed_messages = (before - tables.messages.len()) as u64;

        tables.participants.retain(|(room, _)| *room != room_id);
        tables.rooms.retain(|r| r.id != room_id);

        info!(removed_messages, "Room deleted from memory");
        Ok(removed_messages)
    }

    #[instrument(skip(self))]
    async fn search_rooms(&self, query: Option<&str>) -> Result<Vec<RoomRecord>, AppError> {
        let records = match query {
            Some(query) => self.collect_records(|record| record.matches(query)),
            None => self.collect_records(|_| true),
        };

        debug!(room_count = records.len(), "Rooms searched in memory");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list_rooms_by_host(&self, host_id: Uuid) -> Result<Vec<RoomRecord>, AppError> {
        Ok(self.collect_records(|record| record.host_id == host_id))
    }

    #[instrument(skip(self))]
    async fn list_participants(&self, room_id: Uuid) -> Result<Vec<ParticipantRecord>, AppError> {
        let tables = self.store.lock();
        Ok(tables
            .participants
            .iter()
            .filter(|(room, _)| *room == room_id)
            .filter_map(|(_, user_id)| tables.user(*user_id))
            .map(|user| ParticipantRecord {
                user_id: user.id,
                username: user.username.clone(),
            })
            .collect())
    }
}

const ROOM_RECORD_SELECT: &str = "SELECT r.id, r.host_id, u.username AS host_username, \
     r.topic_id, t.name AS topic_name, r.name, r.description, \
     (SELECT COUNT(*) FROM room_participants p WHERE p.room_id = r.id) AS participant_count, \
     r.created_at, r.updated_at \
     FROM rooms r JOIN users u ON u.id = r.host_id JOIN topics t ON t.id = r.topic_id";

const ROOM_ORDER: &str = "ORDER BY r.updated_at DESC, r.created_at DESC";

/// Escapes LIKE wildcards so the query is matched literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// PostgreSQL implementation of room repository
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self))]
    async fn get_or_create_topic(&self, name: &str) -> Result<TopicModel, AppError> {
        sqlx::query("INSERT INTO topics (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        sqlx::query_as::<_, TopicModel>("SELECT id, name FROM topics WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn get_topic(&self, topic_id: Uuid) -> Result<Option<TopicModel>, AppError> {
        sqlx::query_as::<_, TopicModel>("SELECT id, name FROM topics WHERE id = $1")
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_topics(&self) -> Result<Vec<TopicModel>, AppError> {
        sqlx::query_as::<_, TopicModel>("SELECT id, name FROM topics ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO rooms (id, host_id, topic_id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(room.id)
        .bind(room.host_id)
        .bind(room.topic_id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!("Room created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        sqlx::query_as::<_, RoomModel>(
            "SELECT id, host_id, topic_id, name, description, created_at, updated_at \
             FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn get_room_record(&self, room_id: Uuid) -> Result<Option<RoomRecord>, AppError> {
        sqlx::query_as::<_, RoomRecord>(&format!("{ROOM_RECORD_SELECT} WHERE r.id = $1"))
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE rooms SET topic_id = $2, name = $3, description = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(room.id)
        .bind(room.topic_id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            warn!("Room not found for update");
            return Err(AppError::NotFound("Room not found".to_string()));
        }

        debug!("Room updated successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: Uuid) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let removed_messages = sqlx::query("DELETE FROM messages WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?
            .rows_affected();

        sqlx::query("DELETE FROM room_participants WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            warn!("Room not found for deletion");
            return Err(AppError::NotFound("Room not found".to_string()));
        }

        tx.commit().await.map_err(database_error)?;

        info!(removed_messages, "Room deleted from database");
        Ok(removed_messages)
    }

    #[instrument(skip(self))]
    async fn search_rooms(&self, query: Option<&str>) -> Result<Vec<RoomRecord>, AppError> {
        let sql = format!(
            "{ROOM_RECORD_SELECT} WHERE $1::text IS NULL \
             OR t.name ILIKE $1 OR r.name ILIKE $1 OR r.description ILIKE $1 OR u.username ILIKE $1 \
             {ROOM_ORDER}"
        );

        sqlx::query_as::<_, RoomRecord>(&sql)
            .bind(query.map(like_pattern))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_rooms_by_host(&self, host_id: Uuid) -> Result<Vec<RoomRecord>, AppError> {
        sqlx::query_as::<_, RoomRecord>(&format!(
            "{ROOM_RECORD_SELECT} WHERE r.host_id = $1 {ROOM_ORDER}"
        ))
        .bind(host_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_participants(&self, room_id: Uuid) -> Result<Vec<ParticipantRecord>, AppError> {
        sqlx::query_as::<_, ParticipantRecord>(
            "SELECT p.user_id, u.username FROM room_participants p \
             JOIN users u ON u.id = p.user_id WHERE p.room_id = $1 ORDER BY p.joined_at",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }
}
