use uuid::Uuid;
use validator::Validate;

use crate::{
    chat::{
        chat_dto::SendMessageRequest,
        chat_models::{Chat, ChatSummary, Message, NewMessage},
        chat_repository::ChatRepository,
    },
    error::{AppError, Result},
    user::user_service::UserService,
};

#[derive(Clone)]
pub struct ChatService {
    chat_repository: ChatRepository,
    user_service: UserService,
}

impl ChatService {
    pub fn new(chat_repository: ChatRepository, user_service: UserService) -> Self {
        Self {
            chat_repository,
            user_service,
        }
    }

    /// Opens (creating if needed) the chat with `other_user_id` and marks it read for `user_id`.
    pub async fn open_chat(&self, user_id: Uuid, other_user_id: Uuid) -> Result<Chat> {
        if user_id == other_user_id {
            return Err(AppError::BadRequest(
                "Cannot start a chat with yourself".to_string(),
            ));
        }

        self.user_service.get_user(other_user_id).await?;

        let chat_id = match self
            .chat_repository
            .get_chat_by_participants(user_id, other_user_id)
            .await
        {
            Some(chat) => chat.id,
            None => self.chat_repository.create_chat(user_id, other_user_id).await,
        };
        self.chat_repository
            .mark_messages_as_read(chat_id, user_id)
            .await;

        self.get_chat(user_id, chat_id).await
    }

    pub async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<Chat> {
        let chat = self
            .chat_repository
            .find_by_id(chat_id)
            .await
            .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

        if !chat.has_participant(user_id) {
            return Err(AppError::NotFound("Chat not found".to_string()));
        }

        Ok(chat)
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        chat_id: Uuid,
        payload: SendMessageRequest,
    ) -> Result<Message> {
        payload.validate()?;
        if payload.is_blank() {
            return Err(AppError::Validation("Message is empty".to_string()));
        }

        // Verify membership before appending
        self.get_chat(sender_id, chat_id).await?;

        let new_message = NewMessage {
            text: payload.text.trim().to_string(),
            sender_id,
            attachment: payload.attachment,
        };

        self.chat_repository
            .add_message(chat_id, new_message)
            .await
            .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))
    }

    pub async fn mark_read(&self, reader_id: Uuid, chat_id: Uuid) -> Result<()> {
        self.get_chat(reader_id, chat_id).await?;
        self.chat_repository
            .mark_messages_as_read(chat_id, reader_id)
            .await;
        Ok(())
    }

    pub async fn get_conversations(&self, user_id: Uuid) -> Vec<ChatSummary> {
        self.chat_repository.summaries_for(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chat::chat_models::{Attachment, AttachmentKind},
        store::Store,
        user::{user_models::DuplicatePolicy, user_repository::UserRepository},
    };

    async fn setup() -> (ChatService, ChatRepository, Uuid, Uuid) {
        let store = Store::new(32);
        let users = UserRepository::new(store.clone(), DuplicatePolicy::Replace);
        let chats = ChatRepository::new(store);
        let me = users.create("alice_dev", "+71234567890", "Alice").await.unwrap().id;
        let other = users.create("bob_designer", "+79035550101", "Bob").await.unwrap().id;
        users.set_current_user(Some(me)).await.unwrap();
        (ChatService::new(chats.clone(), UserService::new(users)), chats, me, other)
    }

    #[tokio::test]
    async fn test_open_chat_creates_once_and_marks_read() {
        let (service, chats, me, other) = setup().await;

        let chat = service.open_chat(me, other).await.unwrap();
        assert!(chat.messages.is_empty());

        chats.add_message(chat.id, NewMessage::text(other, "ping")).await;
        let reopened = service.open_chat(me, other).await.unwrap();

        assert_eq!(reopened.id, chat.id);
        assert_eq!(reopened.unread_count, 0);
        assert!(reopened.messages[0].is_read);
        assert_eq!(chats.count().await, 1);
    }

    #[tokio::test]
    async fn test_open_chat_rejects_unknown_or_self() {
        let (service, _, me, _) = setup().await;
        assert!(matches!(
            service.open_chat(me, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.open_chat(me, me).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_send_message_trims_and_rejects_blank() {
        let (service, _, me, other) = setup().await;
        let chat = service.open_chat(me, other).await.unwrap();

        let sent = service
            .send_message(me, chat.id, SendMessageRequest::text("  hello  "))
            .await
            .unwrap();
        assert_eq!(sent.text, "hello");

        let blank = service
            .send_message(me, chat.id, SendMessageRequest::text("   "))
            .await;
        assert!(matches!(blank, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_send_attachment_without_text() {
        let (service, _, me, other) = setup().await;
        let chat = service.open_chat(me, other).await.unwrap();

        let request = SendMessageRequest {
            text: String::new(),
            attachment: Some(Attachment {
                file_name: "report.pdf".to_string(),
                kind: AttachmentKind::File,
            }),
        };
        let sent = service.send_message(me, chat.id, request).await.unwrap();
        assert_eq!(sent.attachment.unwrap().file_name, "report.pdf");
    }

    #[tokio::test]
    async fn test_send_message_requires_membership() {
        let (service, _, me, other) = setup().await;
        let chat = service.open_chat(me, other).await.unwrap();

        let outsider = service
            .send_message(Uuid::new_v4(), chat.id, SendMessageRequest::text("hi"))
            .await;
        assert!(matches!(outsider, Err(AppError::NotFound(_))));

        let missing = service
            .send_message(me, Uuid::new_v4(), SendMessageRequest::text("hi"))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_read_and_conversations() {
        let (service, chats, me, other) = setup().await;
        let chat = service.open_chat(me, other).await.unwrap();
        chats.add_message(chat.id, NewMessage::text(other, "one")).await;
        chats.add_message(chat.id, NewMessage::text(other, "two")).await;

        let before = service.get_conversations(me).await;
        assert_eq!(before[0].unread_count, 2);

        service.mark_read(me, chat.id).await.unwrap();
        let after = service.get_conversations(me).await;
        assert_eq!(after[0].unread_count, 0);
        assert_eq!(after[0].last_message.as_deref(), Some("two"));
    }
}
