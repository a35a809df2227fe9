use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::message::models::{MessageModel, MessageRecord};
use crate::room::models::{RoomModel, RoomRecord, TopicModel};
use crate::session::models::SessionModel;
use crate::user::models::UserModel;

/// Every forum table, kept in insertion order
#[derive(Debug, Default)]
pub struct Tables {
    pub users: Vec<UserModel>,
    pub topics: Vec<TopicModel>,
    pub rooms: Vec<RoomModel>,
    /// (room_id, user_id) pairs in the order users joined
    pub participants: Vec<(Uuid, Uuid)>,
    pub messages: Vec<MessageModel>,
    pub sessions: Vec<SessionModel>,
}

impl Tables {
    pub fn user(&self, user_id: Uuid) -> Option<&UserModel> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn topic(&self, topic_id: Uuid) -> Option<&TopicModel> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    pub fn room(&self, room_id: Uuid) -> Option<&RoomModel> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn participant_count(&self, room_id: Uuid) -> i64 {
        self.participants
            .iter()
            .filter(|(room, _)| *room == room_id)
            .count() as i64
    }

    /// Adds the user to the room's participants; false when already there
    pub fn join_room(&mut self, room_id: Uuid, user_id: Uuid) -> bool {
        if self.participants.contains(&(room_id, user_id)) {
            return false;
        }
        self.participants.push((room_id, user_id));
        true
    }

    /// Joins a room row with its host and topic
    pub fn room_record(&self, room: &RoomModel) -> Option<RoomRecord> {
        let host = self.user(room.host_id)?;
        let topic = self.topic(room.topic_id)?;

        Some(RoomRecord {
            id: room.id,
            host_id: host.id,
            host_username: host.username.clone(),
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            name: room.name.clone(),
            description: room.description.clone(),
            participant_count: self.participant_count(room.id),
            created_at: room.created_at,
            updated_at: room.updated_at,
        })
    }

    /// Joins a message row with its author and room
    pub fn message_record(&self, message: &MessageModel) -> Option<MessageRecord> {
        let author = self.user(message.user_id)?;
        let room = self.room(message.room_id)?;

        Some(MessageRecord {
            id: message.id,
            room_id: room.id,
            room_name: room.name.clone(),
            user_id: author.id,
            username: author.username.clone(),
            body: message.body.clone(),
            created_at: message.created_at,
        })
    }
}

/// Process-local relational store shared by the in-memory repositories.
///
/// One lock guards all tables, so a multi-table write such as deleting a
/// room together with its messages is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
