use serde::Deserialize;
use validator::Validate;

use crate::chat::chat_models::Attachment;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 4096, message = "Message is too long"))]
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl SendMessageRequest {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    /// Nothing to send: blank text and no attachment.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.attachment.is_none()
    }
}
