use super::types::*;
use crate::session::Continuation;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Fully resolved command line for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// `-p <prompt> --output-format json`, then continuation flags, then
/// `--allowedTools` when the setting is non-blank.
pub fn build_args(prompt: &str, continuation: &Continuation, allowed_tools: &str) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        prompt.to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ];

    args.extend(continuation.args());

    let allowed_tools = allowed_tools.trim();
    if !allowed_tools.is_empty() {
        args.push("--allowedTools".to_string());
        args.push(allowed_tools.to_string());
    }

    args
}

/// Receiving half handed to the runner; resolves when the owner asks for a kill
/// or drops its [`ProcessHandle`].
pub type KillSignal = oneshot::Receiver<()>;

/// The orchestrator's hold on a live subprocess.
#[derive(Debug)]
pub struct ProcessHandle {
    kill: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    pub fn pair() -> (Self, KillSignal) {
        let (tx, rx) = oneshot::channel();
        (Self { kill: Some(tx) }, rx)
    }

    /// Returns false when the process already finished.
    pub fn kill(mut self) -> bool {
        match self.kill.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, invocation: Invocation, kill: KillSignal) -> Result<ClaudeReply, RunError>;
}

/// Runs the real CLI as a child process.
pub struct ClaudeCliRunner;

impl ClaudeCliRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClaudeCliRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRunner for ClaudeCliRunner {
    async fn run(&self, invocation: Invocation, mut kill: KillSignal) -> Result<ClaudeReply, RunError> {
        debug!(program = %invocation.program, args = invocation.args.len(), "spawning claude cli");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                command: invocation.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_stdout = async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stdout {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let read_stderr = async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };

        let (stdout, stderr, status) = tokio::select! {
            collected = async { tokio::try_join!(read_stdout, read_stderr, child.wait()) } => collected?,
            _ = &mut kill => {
                info!(pid = ?child.id(), "killing claude cli");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill claude cli");
                }
                return Err(RunError::Killed);
            }
        };

        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);

        if !status.success() {
            let stderr = stderr.trim();
            return Err(RunError::NonZeroExit {
                code: status.code(),
                stderr: if stderr.is_empty() {
                    "Unknown error".to_string()
                } else {
                    stderr.to_string()
                },
            });
        }

        debug!(bytes = stdout.len(), "claude cli finished");
        Ok(ClaudeReply::parse(&stdout))
    }
}
