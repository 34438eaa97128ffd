use super::history::HistoryLedger;
use super::types::*;
use crate::claude::{build_args, AgentRunner, ClaudeReply, Invocation, ProcessHandle, RunError};
use crate::commands::{Dispatcher, InboundMessage};
use crate::session::SessionTracker;
use crate::telegram::Notifier;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Characters of the result kept on a completed history entry.
pub const RESULT_PREVIEW_CHARS: usize = 500;

pub const CANCELLED_BY_USER: &str = "Cancelled by user";
pub const CANCELLED_BEFORE_START: &str = "Cancelled before start";
pub const CANCEL_CONFIRMATION: &str = "Cancelled current job and cleared the queue.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub claude_command: String,
    pub allowed_tools: String,
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            claude_command: "claude".to_string(),
            allowed_tools: String::new(),
            history_limit: 25,
        }
    }
}

/// The running job together with its subprocess. One cannot exist without
/// the other.
struct ActiveJob {
    job: Job,
    process: ProcessHandle,
}

/// Posted by the execution task when the subprocess is done.
#[derive(Debug)]
pub struct JobCompletion {
    pub job_id: String,
    pub outcome: Result<ClaudeReply, RunError>,
}

/// Owns the queue, the current job slot, session tracking and history, and
/// runs at most one Claude process at a time in FIFO order.
pub struct Orchestrator {
    config: OrchestratorConfig,
    queue: VecDeque<Job>,
    current: Option<ActiveJob>,
    sessions: SessionTracker,
    history: HistoryLedger,
    allowed_tools: String,
    ids: JobIdGenerator,
    runner: Arc<dyn AgentRunner>,
    notifier: Arc<dyn Notifier>,
    completion_tx: mpsc::UnboundedSender<JobCompletion>,
    completion_rx: mpsc::UnboundedReceiver<JobCompletion>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        runner: Arc<dyn AgentRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Self {
            history: HistoryLedger::new(config.history_limit),
            allowed_tools: config.allowed_tools.clone(),
            config,
            queue: VecDeque::new(),
            current: None,
            sessions: SessionTracker::new(),
            ids: JobIdGenerator::new(),
            runner,
            notifier,
            completion_tx,
            completion_rx,
        }
    }

    /// Single dispatch loop: inbound chat messages and job completions are
    /// handled one at a time, so no state here needs a lock.
    pub async fn run(mut self, dispatcher: Dispatcher, mut inbound: mpsc::Receiver<InboundMessage>) {
        info!("Orchestrator started");
        loop {
            tokio::select! {
                message = inbound.recv() => match message {
                    Some(message) => dispatcher.handle(&mut self, message).await,
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => {
                    self.complete(completion).await;
                }
            }
        }

        if let Some(active) = self.current.take() {
            info!(job_id = %active.job.id, "Inbound channel closed, killing running job");
            active.process.kill();
        }
        info!("Orchestrator stopped");
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.current.as_ref().map(|active| &active.job)
    }

    pub fn last_session_id(&self) -> Option<&str> {
        self.sessions.last_session_id()
    }

    pub fn allowed_tools(&self) -> &str {
        &self.allowed_tools
    }

    pub fn set_allowed_tools(&mut self, allowed_tools: impl Into<String>) {
        self.allowed_tools = allowed_tools.into();
        info!(allowed_tools = %self.allowed_tools, "Allowed tools changed");
    }

    pub fn create_job(&mut self, prompt: impl Into<String>, mode: JobMode) -> Job {
        Job::new(self.ids.next_id(), prompt, mode)
    }

    /// Delivery failures are logged and otherwise ignored.
    pub async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!(error = %e, "Failed to deliver notification");
        }
    }

    pub async fn enqueue(&mut self, job: Job) {
        info!(job_id = %job.id, mode = %job.mode, "Job queued");
        self.history.record(HistoryEntry::queued(&job));
        let prompt = job.prompt.clone();
        self.queue.push_back(job);

        let position = self.queue.len();
        self.notify(&format!("Queued job ({}):\n{}", position, prompt)).await;
        self.drain().await;
    }

    /// Starts the head of the queue unless a job is already running.
    pub async fn drain(&mut self) {
        if self.current.is_some() {
            return;
        }
        let Some(job) = self.queue.pop_front() else {
            return;
        };

        self.history.update(&job.id, HistoryUpdate::running());
        let continuation = self.sessions.continuation_for(&job);
        let invocation = Invocation::new(
            self.config.claude_command.clone(),
            build_args(&job.prompt, &continuation, &self.allowed_tools),
        );

        let (process, kill) = ProcessHandle::pair();
        let runner = Arc::clone(&self.runner);
        let completion_tx = self.completion_tx.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            let outcome = runner.run(invocation, kill).await;
            let _ = completion_tx.send(JobCompletion { job_id, outcome });
        });

        info!(job_id = %job.id, mode = %job.mode, ?continuation, "Job started");
        let notice = format!("Starting {} job:\n{}", job.mode, job.prompt);
        self.current = Some(ActiveJob { job, process });
        self.notify(&notice).await;
    }

    /// Awaits the next finished execution and applies it.
    #[cfg(test)]
    pub async fn process_next_completion(&mut self) {
        if let Some(completion) = self.completion_rx.recv().await {
            self.complete(completion).await;
        }
    }

    pub async fn complete(&mut self, completion: JobCompletion) {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|active| active.job.id == completion.job_id);
        if !is_current {
            debug!(job_id = %completion.job_id, "Discarding completion for job that is no longer current");
            return;
        }
        let Some(ActiveJob { job, .. }) = self.current.take() else {
            return;
        };

        match completion.outcome {
            Ok(reply) => {
                self.sessions.observe(reply.session_id.as_deref());
                let text = reply.text();
                let preview: String = text.chars().take(RESULT_PREVIEW_CHARS).collect();
                let session_id = reply.session_id.or_else(|| job.session_id.clone());
                self.history
                    .update(&job.id, HistoryUpdate::completed(preview, session_id));
                info!(job_id = %job.id, "Job completed");

                let body = if text.is_empty() {
                    "No output returned."
                } else {
                    text.as_str()
                };
                self.notify(&format!("Job complete:\n{}", body)).await;
            }
            Err(e) => {
                self.history.update(&job.id, HistoryUpdate::failed(e.summary()));
                warn!(job_id = %job.id, error = %e, "Job failed");
                self.notify(&format!("Job failed:\n{}", e)).await;
            }
        }

        self.drain().await;
    }

    /// Kills the running job, cancels everything queued, and always confirms.
    pub async fn cancel(&mut self) {
        if let Some(ActiveJob { job, process }) = self.current.take() {
            process.kill();
            self.history
                .update(&job.id, HistoryUpdate::cancelled(CANCELLED_BY_USER));
            info!(job_id = %job.id, "Running job cancelled");
        }

        for job in self.queue.drain(..) {
            self.history
                .update(&job.id, HistoryUpdate::cancelled(CANCELLED_BEFORE_START));
            info!(job_id = %job.id, "Queued job cancelled");
        }

        self.notify(CANCEL_CONFIRMATION).await;
    }
}
