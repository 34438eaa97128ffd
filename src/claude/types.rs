use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use thiserror::Error;

/// What the CLI handed back, in precedence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaudeOutput {
    /// Non-blank string `result` field.
    Text(String),
    /// `structured_output` field, any JSON shape.
    Structured(Value),
    /// Trimmed stdout, used when nothing better is available.
    Raw(String),
}

impl ClaudeOutput {
    pub fn render(&self) -> String {
        match self {
            ClaudeOutput::Text(text) | ClaudeOutput::Raw(text) => text.clone(),
            ClaudeOutput::Structured(Value::String(text)) => text.trim().to_string(),
            ClaudeOutput::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeReply {
    pub output: ClaudeOutput,
    pub session_id: Option<String>,
}

impl ClaudeReply {
    /// Interprets stdout from `--output-format json`. Output that is not JSON
    /// falls back to the raw text without a session id.
    pub fn parse(stdout: &str) -> Self {
        let raw = stdout.trim().to_string();
        let fields = match serde_json::from_str::<Value>(stdout) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                return Self {
                    output: ClaudeOutput::Raw(raw),
                    session_id: None,
                }
            }
        };

        let session_id = fields
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let text_result = fields
            .get("result")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty());

        let output = if let Some(text) = text_result {
            ClaudeOutput::Text(text.to_string())
        } else if let Some(structured) = fields.get("structured_output") {
            ClaudeOutput::Structured(structured.clone())
        } else {
            ClaudeOutput::Raw(raw)
        };

        Self { output, session_id }
    }

    pub fn text(&self) -> String {
        self.output.render()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read Claude output: {0}")]
    Io(#[from] io::Error),

    #[error("Claude CLI failed: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Claude CLI was killed")]
    Killed,
}

impl RunError {
    /// Text stored on the history entry.
    pub fn summary(&self) -> String {
        match self {
            RunError::NonZeroExit { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
