use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a job relates to earlier Claude sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Task,
    Continue,
    Resume,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::Task => "task",
            JobMode::Continue => "continue",
            JobMode::Resume => "resume",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub prompt: String,
    pub mode: JobMode,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, prompt: impl Into<String>, mode: JobMode) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            mode,
            session_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger projection of a job. Survives after the job itself is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub mode: JobMode,
    pub session_id: Option<String>,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result_preview: Option<String>,
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn queued(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            prompt: job.prompt.clone(),
            mode: job.mode,
            session_id: job.session_id.clone(),
            status: JobStatus::Queued,
            started_at: None,
            ended_at: None,
            result_preview: None,
            error: None,
        }
    }

    /// Merges every field set on `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: HistoryUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.started_at.is_some() {
            self.started_at = update.started_at;
        }
        if update.ended_at.is_some() {
            self.ended_at = update.ended_at;
        }
        if update.result_preview.is_some() {
            self.result_preview = update.result_preview;
        }
        if update.session_id.is_some() {
            self.session_id = update.session_id;
        }
        if update.error.is_some() {
            self.error = update.error;
        }
    }
}

/// Partial set of history fields.
#[derive(Debug, Clone, Default)]
pub struct HistoryUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result_preview: Option<String>,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

impl HistoryUpdate {
    pub fn running() -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn completed(result_preview: String, session_id: Option<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            ended_at: Some(Utc::now()),
            result_preview: Some(result_preview),
            session_id,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            ended_at: Some(Utc::now()),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Cancelled),
            ended_at: Some(Utc::now()),
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Produces `job_<millis>_<seq>_<suffix>` ids. The sequence number keeps ids
/// unique even when two jobs land in the same millisecond with the same suffix.
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    seq: u64,
}

impl JobIdGenerator {
    const SUFFIX_LEN: usize = 6;
    const ALPHABET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        let mut rng = rand::thread_rng();
        let suffix: String = (0..Self::SUFFIX_LEN)
            .map(|_| Self::ALPHABET[rng.gen_range(0..Self::ALPHABET.len())] as char)
            .collect();
        format!("job_{}_{}_{}", Utc::now().timestamp_millis(), self.seq, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_job_ids_are_unique() {
        let mut ids = JobIdGenerator::new();
        let generated: HashSet<String> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 500);
        assert!(generated.iter().all(|id| id.starts_with("job_")));
    }

    #[test]
    fn test_apply_merges_only_set_fields() {
        let job = Job::new("job_1".to_string(), "fix bug", JobMode::Resume).with_session("s-old");
        let mut entry = HistoryEntry::queued(&job);

        entry.apply(HistoryUpdate::running());
        assert_eq!(entry.status, JobStatus::Running);
        assert!(entry.started_at.is_some());
        assert_eq!(entry.session_id.as_deref(), Some("s-old"));

        entry.apply(HistoryUpdate::completed("done".to_string(), None));
        assert_eq!(entry.status, JobStatus::Completed);
        assert!(entry.started_at.is_some());
        assert!(entry.ended_at.is_some());
        assert_eq!(entry.result_preview.as_deref(), Some("done"));
        assert_eq!(entry.session_id.as_deref(), Some("s-old"));
        assert!(entry.error.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }
}
