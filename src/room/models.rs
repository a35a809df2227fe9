use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for topics table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TopicModel {
    pub id: Uuid,
    pub name: String,
}

impl TopicModel {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// Database model for rooms table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RoomModel {
    pub id: Uuid,
    pub host_id: Uuid,
    pub topic_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomModel {
    pub fn new(host_id: Uuid, topic_id: Uuid, name: String, description: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            host_id,
            topic_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_hosted_by(&self, user_id: Uuid) -> bool {
        self.host_id == user_id
    }
}

/// A room joined with its host, topic and participant count
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RoomRecord {
    pub id: Uuid,
    pub host_id: Uuid,
    pub host_username: String,
    pub topic_id: Uuid,
    pub topic_name: String,
    pub name: String,
    pub description: String,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomRecord {
    /// Case-insensitive substring match on topic, name, description or host
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();

        [
            &self.topic_name,
            &self.name,
            &self.description,
            &self.host_username,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A user who has posted in a room
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ParticipantRecord {
    pub user_id: Uuid,
    pub username: String,
}
