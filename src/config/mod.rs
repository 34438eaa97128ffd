use crate::commands::Dispatcher;
use crate::queue::OrchestratorConfig;
use crate::telegram::DEFAULT_API_BASE;
use clap::Args;
use thiserror::Error;

pub const DEFAULT_HISTORY_LIMIT: usize = 25;

/// Non-numeric or zero limits fall back to the default instead of failing.
fn parse_history_limit(value: &str) -> Result<usize, String> {
    Ok(value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT))
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[arg(
        long,
        env = "AGENT_REACHOUT_TELEGRAM_BOT_TOKEN",
        hide_env_values = true,
        help = "Telegram bot token"
    )]
    pub bot_token: Option<String>,

    #[arg(
        long,
        env = "AGENT_REACHOUT_TELEGRAM_CHAT_ID",
        help = "The only chat allowed to issue commands and receive notifications"
    )]
    pub chat_id: Option<String>,

    #[arg(
        long,
        env = "AGENT_REACHOUT_TELEGRAM_TASK_PREFIX",
        default_value = "/task",
        help = "Command that queues a new task"
    )]
    pub task_prefix: String,

    #[arg(
        long,
        env = "AGENT_REACHOUT_CLAUDE_COMMAND",
        default_value = "claude",
        help = "Claude Code executable"
    )]
    pub claude_command: String,

    #[arg(
        long,
        env = "AGENT_REACHOUT_ALLOWED_TOOLS",
        default_value = "",
        help = "Initial --allowedTools value passed to Claude"
    )]
    pub allowed_tools: String,

    #[arg(
        long,
        env = "AGENT_REACHOUT_HISTORY_LIMIT",
        default_value_t = DEFAULT_HISTORY_LIMIT,
        value_parser = parse_history_limit,
        help = "Number of jobs kept in history"
    )]
    pub history_limit: usize,

    #[arg(
        long,
        env = "AGENT_REACHOUT_TELEGRAM_API_BASE",
        default_value = DEFAULT_API_BASE,
        help = "Base URL for the Telegram Bot API"
    )]
    pub telegram_api_base: String,

    #[arg(
        long,
        env = "AGENT_REACHOUT_POLL_TIMEOUT_SECS",
        default_value_t = 30,
        help = "Long-poll timeout for getUpdates"
    )]
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("AGENT_REACHOUT_TELEGRAM_BOT_TOKEN is required")]
    MissingBotToken,

    #[error("AGENT_REACHOUT_TELEGRAM_CHAT_ID is required")]
    MissingChatId,

    #[error("{0} must not be empty")]
    Blank(&'static str),
}

/// Validated settings shared by every subcommand.
#[derive(Clone)]
pub struct ReachoutConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub task_prefix: String,
    pub claude_command: String,
    pub allowed_tools: String,
    pub history_limit: usize,
    pub telegram_api_base: String,
    pub poll_timeout_secs: u64,
}

impl std::fmt::Debug for ReachoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachoutConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("task_prefix", &self.task_prefix)
            .field("claude_command", &self.claude_command)
            .field("allowed_tools", &self.allowed_tools)
            .field("history_limit", &self.history_limit)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

fn required(value: Option<String>, missing: ConfigError) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(missing)
}

fn non_blank(value: String, name: &'static str) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::Blank(name));
    }
    Ok(value)
}

impl ConfigArgs {
    pub fn resolve(self) -> Result<ReachoutConfig, ConfigError> {
        Ok(ReachoutConfig {
            bot_token: required(self.bot_token, ConfigError::MissingBotToken)?,
            chat_id: required(self.chat_id, ConfigError::MissingChatId)?,
            task_prefix: non_blank(self.task_prefix, "AGENT_REACHOUT_TELEGRAM_TASK_PREFIX")?,
            claude_command: non_blank(self.claude_command, "AGENT_REACHOUT_CLAUDE_COMMAND")?,
            allowed_tools: self.allowed_tools,
            history_limit: self.history_limit,
            telegram_api_base: non_blank(self.telegram_api_base, "AGENT_REACHOUT_TELEGRAM_API_BASE")?,
            poll_timeout_secs: self.poll_timeout_secs,
        })
    }
}

impl ReachoutConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            claude_command: self.claude_command.clone(),
            allowed_tools: self.allowed_tools.clone(),
            history_limit: self.history_limit,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.chat_id.clone(), self.task_prefix.clone())
    }
}
