use super::client::{TelegramClient, TelegramError};
use super::types::Update;
use crate::commands::InboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls `getUpdates` and feeds messages into the dispatch channel.
pub struct TelegramPoller {
    client: Arc<TelegramClient>,
    timeout_secs: u64,
    offset: i64,
    retry_delay: Duration,
}

impl TelegramPoller {
    pub fn new(client: Arc<TelegramClient>, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
            offset: 0,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetches one batch and advances the offset past every update seen,
    /// including ones that carry no message.
    pub async fn poll_once(&mut self) -> Result<Vec<InboundMessage>, TelegramError> {
        let updates = self.client.get_updates(self.offset, self.timeout_secs).await?;

        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            self.offset = self.offset.max(max_id + 1);
        }

        Ok(updates.into_iter().filter_map(to_inbound).collect())
    }

    /// Runs until the receiving side goes away.
    pub async fn run(mut self, tx: mpsc::Sender<InboundMessage>) {
        info!("Telegram polling started");
        loop {
            match self.poll_once().await {
                Ok(messages) => {
                    for message in messages {
                        if tx.send(message).await.is_err() {
                            info!("Dispatch channel closed, stopping Telegram polling");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Telegram polling error");
                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_delay) => {}
                        _ = tx.closed() => return,
                    }
                }
            }

            if tx.is_closed() {
                debug!("Dispatch channel closed");
                return;
            }
        }
    }
}

fn to_inbound(update: Update) -> Option<InboundMessage> {
    let message = update.message?;
    Some(InboundMessage {
        chat_id: message.chat.id.to_string(),
        text: message.text,
        from_bot: message.from.map(|user| user.is_bot).unwrap_or(false),
    })
}
