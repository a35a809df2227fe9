use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{ParticipantRecord, RoomModel, RoomRecord, TopicModel};
use crate::message::types::MessageResponse;
use crate::shared::AppError;

pub const MAX_TOPIC_LEN: usize = 200;
pub const MAX_ROOM_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Number of platform-wide messages shown on the listing page
pub const RECENT_MESSAGE_LIMIT: usize = 5;

/// Query string of the listing page
#[derive(Debug, Default, Deserialize)]
pub struct ListRoomsQuery {
    pub q: Option<String>,
}

/// Room create/update form submission; the topic is named, not referenced
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RoomForm {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RoomForm {
    /// Trims every field and checks required fields and lengths
    pub fn validate(self) -> Result<RoomForm, AppError> {
        let form = RoomForm {
            topic: self.topic.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        };

        check_required("Topic", &form.topic, MAX_TOPIC_LEN)?;
        check_required("Name", &form.name, MAX_ROOM_NAME_LEN)?;
        if form.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "Description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        Ok(form)
    }
}

fn check_required(field: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<TopicModel> for TopicResponse {
    fn from(topic: TopicModel) -> Self {
        Self {
            id: topic.id,
            name: topic.name,
        }
    }
}

/// Response for room information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub topic: String,
    pub host_id: Uuid,
    pub host: String,
    pub participant_count: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<RoomRecord> for RoomResponse {
    fn from(record: RoomRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            topic: record.topic_name,
            host_id: record.host_id,
            host: record.host_username,
            participant_count: record.participant_count,
            created: record.created_at,
            updated: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub username: String,
}

impl From<ParticipantRecord> for ParticipantResponse {
    fn from(participant: ParticipantRecord) -> Self {
        Self {
            id: participant.user_id,
            username: participant.username,
        }
    }
}

/// View for the listing/search page
#[derive(Debug, Serialize, Deserialize)]
pub struct HomeView {
    pub rooms: Vec<RoomResponse>,
    pub topics: Vec<TopicResponse>,
    pub room_count: usize,
    pub room_messages: Vec<MessageResponse>,
}

/// View for a single room's conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomDetailView {
    pub room: RoomResponse,
    pub room_messages: Vec<MessageResponse>,
    pub participants: Vec<ParticipantResponse>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RoomFormPage {
    Create,
    Update,
}

/// View for the room create/update form
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomFormView {
    pub page: RoomFormPage,
    pub topics: Vec<TopicResponse>,
    /// Current values when editing an existing room
    pub form: Option<RoomForm>,
}

/// Confirmation step shown before a delete is carried out
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfirmDeleteView {
    pub object: String,
}

/// Prefill for the update form
pub fn room_form_values(room: &RoomModel, topic_name: String) -> RoomForm {
    RoomForm {
        topic: topic_name,
        name: room.name.clone(),
        description: room.description.clone(),
    }
}
