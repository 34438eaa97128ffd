use super::parser::Command;
use super::InboundMessage;
use crate::queue::{JobMode, Orchestrator};
use tracing::{debug, info};

pub const DEFAULT_HISTORY_COUNT: usize = 5;

/// Turns chat messages from the configured chat into orchestrator calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    chat_id: String,
    task_prefix: String,
    bot_username: Option<String>,
}

impl Dispatcher {
    pub fn new(chat_id: impl Into<String>, task_prefix: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            task_prefix: task_prefix.into(),
            bot_username: None,
        }
    }

    /// Commands addressed as `/command@other_bot` are ignored once the
    /// bot's own username is known.
    pub fn with_bot_username(mut self, bot_username: Option<String>) -> Self {
        self.bot_username = bot_username;
        self
    }

    pub fn task_prefix(&self) -> &str {
        &self.task_prefix
    }

    /// Messages from other chats, from bots, or without text never reach the
    /// parser. Unknown commands are dropped silently.
    pub async fn handle(&self, orchestrator: &mut Orchestrator, message: InboundMessage) {
        if message.chat_id != self.chat_id {
            debug!(chat_id = %message.chat_id, "Ignoring message from unknown chat");
            return;
        }
        if message.from_bot {
            debug!("Ignoring message from bot");
            return;
        }
        let Some(text) = message.text else {
            return;
        };

        let Some(command) = Command::parse(&text, &self.task_prefix, self.bot_username.as_deref()) else {
            debug!("Ignoring unrecognized message");
            return;
        };
        info!(?command, "Handling command");

        match command {
            Command::Task(prompt) => self.submit(orchestrator, prompt, JobMode::Task).await,
            Command::Continue(prompt) => {
                self.submit(orchestrator, prompt, JobMode::Continue).await
            }
            Command::Resume(rest) => handle_resume(orchestrator, &rest).await,
            Command::History(rest) => handle_history(orchestrator, &rest).await,
            Command::Status => {
                let status = status_report(orchestrator);
                orchestrator.notify(&status).await;
            }
            Command::Cancel => orchestrator.cancel().await,
            Command::AllowedTools(list) => handle_allowed_tools(orchestrator, list).await,
            Command::Help => orchestrator.notify(&self.help_text()).await,
        }
    }

    async fn submit(&self, orchestrator: &mut Orchestrator, prompt: String, mode: JobMode) {
        if prompt.is_empty() {
            let usage = match mode {
                JobMode::Continue => "Usage: /continue <task description>".to_string(),
                _ => format!("Usage: {} <task description>", self.task_prefix),
            };
            orchestrator.notify(&usage).await;
            return;
        }

        let job = orchestrator.create_job(prompt, mode);
        orchestrator.enqueue(job).await;
    }

    pub fn help_text(&self) -> String {
        [
            "Commands:".to_string(),
            format!("{} <task> - queue a new task", self.task_prefix),
            "/continue <task> - continue the last session".to_string(),
            "/resume <session_id> <task> - resume a specific session".to_string(),
            "/history [count] - show recent jobs".to_string(),
            "/status - show the running job and queue".to_string(),
            "/cancel - stop the running job and clear the queue".to_string(),
            "/allowed_tools <list> - set allowed tools (empty clears)".to_string(),
            "/help - show this message".to_string(),
        ]
        .join("\n")
    }
}

async fn handle_resume(orchestrator: &mut Orchestrator, rest: &str) {
    let parsed = rest
        .split_once(char::is_whitespace)
        .map(|(session_id, prompt)| (session_id, prompt.trim()))
        .filter(|(session_id, prompt)| !session_id.is_empty() && !prompt.is_empty());

    let Some((session_id, prompt)) = parsed else {
        orchestrator
            .notify("Usage: /resume <session_id> <task description>")
            .await;
        return;
    };

    let job = orchestrator
        .create_job(prompt, JobMode::Resume)
        .with_session(session_id);
    orchestrator.enqueue(job).await;
}

async fn handle_history(orchestrator: &mut Orchestrator, rest: &str) {
    let count = history_count(rest, orchestrator.history().limit());
    let lines = orchestrator.history().preview(count);

    if lines.is_empty() {
        orchestrator.notify("No task history yet.").await;
    } else {
        orchestrator
            .notify(&format!("Recent jobs:\n{}", lines.join("\n")))
            .await;
    }
}

/// Positive integer argument, else the default, never above the ledger cap.
pub fn history_count(arg: &str, limit: usize) -> usize {
    arg.trim()
        .parse::<usize>()
        .ok()
        .filter(|count| *count > 0)
        .unwrap_or(DEFAULT_HISTORY_COUNT)
        .min(limit)
}

pub fn status_report(orchestrator: &Orchestrator) -> String {
    let running = match orchestrator.current_job() {
        Some(job) => format!("Running: {}", job.prompt),
        None => "Idle".to_string(),
    };
    let queued = match orchestrator.queue_len() {
        0 => "No queued jobs".to_string(),
        n => format!("Queued: {}", n),
    };
    let session = format!(
        "Last session: {}",
        orchestrator.last_session_id().unwrap_or("none")
    );
    let tools = match orchestrator.allowed_tools().trim() {
        "" => "Allowed tools: (none)".to_string(),
        tools => format!("Allowed tools: {}", tools),
    };

    [running, queued, session, tools].join("\n")
}

async fn handle_allowed_tools(orchestrator: &mut Orchestrator, list: String) {
    if list.is_empty() {
        orchestrator.set_allowed_tools("");
        orchestrator
            .notify("Cleared allowed tools. Future tasks will require approvals.")
            .await;
        return;
    }

    let notice = format!("Allowed tools updated:\n{}", list);
    orchestrator.set_allowed_tools(list);
    orchestrator.notify(&notice).await;
}
