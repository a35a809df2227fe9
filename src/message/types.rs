use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::MessageRecord;

/// Message form posted to a room page
#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub room: String,
    pub user_id: Uuid,
    pub user: String,
    pub body: String,
    pub created: DateTime<Utc>,
}

impl From<MessageRecord> for MessageResponse {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            room_id: record.room_id,
            room: record.room_name,
            user_id: record.user_id,
            user: record.username,
            body: record.body,
            created: record.created_at,
        }
    }
}
