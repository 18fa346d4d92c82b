use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{auth_dto::RegisterRequest, auth_models::AuthState},
    chat::chat_models::{Attachment, Chat, ChatSummary, Message},
    store::{StoreEvent, StoreSnapshot},
    user::user_models::User,
};

// Session-to-client messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleMessage {
    AuthState(AuthState),
    SearchResults { users: Vec<User> },
    ChatOpened { chat: Chat },
    MessageSent { chat_id: Uuid, message: Message },
    Chats { chats: Vec<ChatSummary> },
    Snapshot(StoreSnapshot),
    StoreEvent { event: StoreEvent },
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ConsoleMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ConsoleMessage::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

// Client-to-session commands
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    SubmitPhone {
        phone: String,
    },
    SubmitPassword {
        password: String,
    },
    GoToRegister,
    Back,
    SubmitRegister(RegisterRequest),
    Logout,
    Search {
        query: String,
    },
    OpenChat {
        user_id: Uuid,
    },
    SendMessage {
        chat_id: Uuid,
        #[serde(default)]
        text: String,
        attachment: Option<Attachment>,
    },
    MarkRead {
        chat_id: Uuid,
    },
    ListChats,
    Snapshot,
}
