use super::client::{TelegramClient, TelegramError};
use async_trait::async_trait;
use std::sync::Arc;

/// Longest message body sent before truncation.
pub const MAX_MESSAGE_CHARS: usize = 3500;
pub const TRUNCATION_MARKER: &str = "\n\n[truncated]";

/// Cuts `text` to [`MAX_MESSAGE_CHARS`] characters and appends the marker.
pub fn truncate_for_chat(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), TelegramError>;
}

/// Delivers notifications to the one configured chat.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), TelegramError> {
        self.client
            .send_message(&self.chat_id, &truncate_for_chat(text))
            .await?;
        Ok(())
    }
}
