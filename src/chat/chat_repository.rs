use chrono::Utc;
use uuid::Uuid;

use crate::{
    chat::chat_models::{Chat, ChatSummary, Message, NewMessage},
    store::{
        store_events::{ChatCreatedPayload, MessageAddedPayload, MessagesReadPayload},
        Store, StoreEvent,
    },
};

#[derive(Clone)]
pub struct ChatRepository {
    store: Store,
}

impl ChatRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the id of the chat between `a` and `b`, creating it on first contact.
    pub async fn create_chat(&self, a: Uuid, b: Uuid) -> Uuid {
        let chat = {
            let mut state = self.store.write().await;
            if let Some(existing) = state.chats.iter().find(|c| c.is_between(a, b)) {
                return existing.id;
            }
            let chat = Chat::new(a, b);
            state.chats.push(chat.clone());
            chat
        };

        tracing::info!(chat_id = %chat.id, "Created chat between {} and {}", a, b);
        self.store.publish(StoreEvent::ChatCreated(ChatCreatedPayload {
            chat_id: chat.id,
            participants: chat.participants,
        }));

        chat.id
    }

    /// Appends a message. Unknown chats are ignored and yield `None`.
    pub async fn add_message(&self, chat_id: Uuid, new_message: NewMessage) -> Option<Message> {
        let (message, unread_count) = {
            let mut state = self.store.write().await;
            let current_user_id = state.current_user_id;
            let Some(chat) = state.chat_mut(chat_id) else {
                tracing::warn!(%chat_id, "add_message on unknown chat ignored");
                return None;
            };

            let message = Message {
                id: Uuid::new_v4(),
                text: new_message.text,
                sender_id: new_message.sender_id,
                timestamp: Utc::now(),
                is_read: false,
                attachment: new_message.attachment,
            };

            if current_user_id != Some(message.sender_id) {
                chat.unread_count += 1;
            }
            chat.messages.push(message.clone());
            chat.last_message = Some(message.clone());
            (message, chat.unread_count)
        };

        self.store.publish(StoreEvent::MessageAdded(MessageAddedPayload {
            chat_id,
            message: message.clone(),
            unread_count,
        }));

        Some(message)
    }

    /// Marks everything not sent by `reader_id` as read and zeroes the unread
    /// counter. Returns `false` if the chat does not exist.
    pub async fn mark_messages_as_read(&self, chat_id: Uuid, reader_id: Uuid) -> bool {
        {
            let mut state = self.store.write().await;
            let Some(chat) = state.chat_mut(chat_id) else {
                tracing::warn!(%chat_id, "mark_messages_as_read on unknown chat ignored");
                return false;
            };
            for message in chat.messages.iter_mut().filter(|m| m.sender_id != reader_id) {
                message.is_read = true;
            }
            if let Some(last) = chat.last_message.as_mut() {
                if last.sender_id != reader_id {
                    last.is_read = true;
                }
            }
            chat.unread_count = 0;
        }

        self.store
            .publish(StoreEvent::MessagesRead(MessagesReadPayload { chat_id, reader_id }));
        true
    }

    pub async fn get_chat_by_participants(&self, a: Uuid, b: Uuid) -> Option<Chat> {
        self.store
            .read()
            .await
            .chats
            .iter()
            .find(|c| c.is_between(a, b))
            .cloned()
    }

    pub async fn find_by_id(&self, chat_id: Uuid) -> Option<Chat> {
        self.store.read().await.chat(chat_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.store.read().await.chats.len()
    }

    /// Chat list rows for `user_id`, most recent activity first. Chats without
    /// messages keep creation order after the active ones.
    pub async fn summaries_for(&self, user_id: Uuid) -> Vec<ChatSummary> {
        let state = self.store.read().await;
        let mut summaries: Vec<ChatSummary> = state
            .chats
            .iter()
            .filter_map(|chat| {
                let other_user_id = chat.other_participant(user_id)?;
                Some(ChatSummary {
                    chat_id: chat.id,
                    other_user_id,
                    other_user: state.user(other_user_id).cloned(),
                    last_message: chat.last_message.as_ref().map(|m| m.text.clone()),
                    last_message_time: chat.last_activity(),
                    unread_count: chat.unread_count,
                })
            })
            .collect();

        // Stable sort keeps creation order among equal keys.
        summaries.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        summaries
    }
}
