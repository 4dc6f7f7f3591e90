//! Chat transport seam.

use async_trait::async_trait;

use crate::errors::TransportError;

/// One update delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Monotonic update identifier; the next poll starts after it.
    pub update_id: i64,
    /// Message carried by the update, if any.
    pub message: Option<IncomingMessage>,
}

/// Inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message identifier within the chat.
    pub message_id: i64,
    /// Chat the message was posted in.
    pub chat_id: i64,
    /// Display name of the sender.
    pub sender: Option<String>,
    /// Text body. `None` for media-only messages.
    pub text: Option<String>,
}

impl IncomingMessage {
    /// Non-empty text body.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Receives updates and posts replies on a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch updates with `update_id >= offset`, waiting for new ones when
    /// none are pending.
    async fn poll_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError>;

    /// Post `text` to `chat_id` as a reply to message `reply_to`.
    async fn send_reply(&self, chat_id: i64, reply_to: i64, text: &str)
    -> Result<(), TransportError>;
}
