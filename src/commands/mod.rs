pub mod dispatcher;
pub mod parser;

pub use dispatcher::Dispatcher;
pub use parser::{parse_command, Command, ParsedCommand};

/// A chat message as the dispatcher sees it, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: String,
    pub text: Option<String>,
    pub from_bot: bool,
}

impl InboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: Some(text.into()),
            from_bot: false,
        }
    }
}
