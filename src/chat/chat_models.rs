use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::user_models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    File,
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::File => write!(f, "file"),
        }
    }
}

/// A local file reference sent along with a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub kind: AttachmentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub attachment: Option<Attachment>,
}

/// Message fields supplied by the caller; id and timestamp are assigned on append.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub sender_id: Uuid,
    pub attachment: Option<Attachment>,
}

impl NewMessage {
    #[cfg(test)]
    pub fn text(sender_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender_id,
            attachment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub messages: Vec<Message>,
    pub last_message: Option<Message>,
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(first: Uuid, second: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants: [first, second],
            messages: Vec::new(),
            last_message: None,
            unread_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Unordered pair comparison.
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        let [x, y] = self.participants;
        (x == a && y == b) || (x == b && y == a)
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        match self.participants {
            [x, y] if x == user_id => Some(y),
            [x, y] if y == user_id => Some(x),
            _ => None,
        }
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.timestamp)
    }
}

/// One row of a user's chat list.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub chat_id: Uuid,
    pub other_user_id: Uuid,
    pub other_user: Option<User>,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: u32,
}
