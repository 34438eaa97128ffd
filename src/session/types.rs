use serde::{Deserialize, Serialize};

/// Which continuation flags a Claude invocation carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// New conversation, no flags.
    Fresh,
    /// `--continue`: let the CLI pick its most recent conversation.
    MostRecent,
    /// `--resume <id>`
    Resume(String),
}

impl Continuation {
    pub fn args(&self) -> Vec<String> {
        match self {
            Continuation::Fresh => Vec::new(),
            Continuation::MostRecent => vec!["--continue".to_string()],
            Continuation::Resume(session_id) => {
                vec!["--resume".to_string(), session_id.clone()]
            }
        }
    }
}
