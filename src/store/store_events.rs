use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{chat::chat_models::Message, user::user_models::User};

/// Change notifications published after every store mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    UserAdded(UserAddedPayload),
    UserStatus(UserStatusPayload),
    CurrentUserChanged(CurrentUserPayload),
    ChatCreated(ChatCreatedPayload),
    MessageAdded(MessageAddedPayload),
    MessagesRead(MessagesReadPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAddedPayload {
    pub user: User,
    pub replaced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatusPayload {
    pub user_id: Uuid,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserPayload {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCreatedPayload {
    pub chat_id: Uuid,
    pub participants: [Uuid; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAddedPayload {
    pub chat_id: Uuid,
    pub message: Message,
    pub unread_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReadPayload {
    pub chat_id: Uuid,
    pub reader_id: Uuid,
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::UserAdded(_) => "user_added",
            StoreEvent::UserStatus(_) => "user_status",
            StoreEvent::CurrentUserChanged(_) => "current_user_changed",
            StoreEvent::ChatCreated(_) => "chat_created",
            StoreEvent::MessageAdded(_) => "message_added",
            StoreEvent::MessagesRead(_) => "messages_read",
        }
    }
}
