pub mod client;
pub mod notifier;
pub mod poller;
pub mod reply;
pub mod types;

pub use client::{TelegramClient, TelegramError, DEFAULT_API_BASE};
pub use notifier::{truncate_for_chat, Notifier, TelegramNotifier};
pub use poller::TelegramPoller;
pub use reply::{PendingReply, ReplyError, ReplyWaiter};
pub use types::*;
