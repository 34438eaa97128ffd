use super::types::*;
use crate::queue::{Job, JobMode};
use tracing::debug;

/// Remembers the last session id a successful job reported.
#[derive(Debug, Default, Clone)]
pub struct SessionTracker {
    last_session_id: Option<String>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_session_id(&self) -> Option<&str> {
        self.last_session_id.as_deref()
    }

    /// Called on the success path only. Failed and cancelled jobs never
    /// reach here, so they cannot overwrite the tracked id.
    pub fn observe(&mut self, session_id: Option<&str>) {
        if let Some(session_id) = session_id.filter(|id| !id.is_empty()) {
            debug!(session_id, "tracking latest claude session");
            self.last_session_id = Some(session_id.to_string());
        }
    }

    pub fn continuation_for(&self, job: &Job) -> Continuation {
        match job.mode {
            JobMode::Task => Continuation::Fresh,
            JobMode::Continue => match &self.last_session_id {
                Some(session_id) => Continuation::Resume(session_id.clone()),
                None => Continuation::MostRecent,
            },
            JobMode::Resume => match &job.session_id {
                Some(session_id) => Continuation::Resume(session_id.clone()),
                None => Continuation::Fresh,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(mode: JobMode) -> Job {
        Job::new("job_1".to_string(), "prompt", mode)
    }

    #[test]
    fn test_continue_without_tracked_session_uses_generic_flag() {
        let tracker = SessionTracker::new();
        assert_eq!(
            tracker.continuation_for(&job(JobMode::Continue)),
            Continuation::MostRecent
        );
    }

    #[test]
    fn test_continue_uses_tracked_session() {
        let mut tracker = SessionTracker::new();
        tracker.observe(Some("s1"));
        assert_eq!(
            tracker.continuation_for(&job(JobMode::Continue)),
            Continuation::Resume("s1".to_string())
        );
    }

    #[test]
    fn test_resume_uses_explicit_session_over_tracked() {
        let mut tracker = SessionTracker::new();
        tracker.observe(Some("s1"));
        let resume = job(JobMode::Resume).with_session("old-session");
        assert_eq!(
            tracker.continuation_for(&resume),
            Continuation::Resume("old-session".to_string())
        );
    }

    #[test]
    fn test_task_mode_is_always_fresh() {
        let mut tracker = SessionTracker::new();
        tracker.observe(Some("s1"));
        assert_eq!(tracker.continuation_for(&job(JobMode::Task)), Continuation::Fresh);
    }

    #[test]
    fn test_observe_none_keeps_previous_session() {
        let mut tracker = SessionTracker::new();
        tracker.observe(Some("s1"));
        tracker.observe(None);
        assert_eq!(tracker.last_session_id(), Some("s1"));
    }

    #[test]
    fn test_observe_empty_id_is_ignored() {
        let mut tracker = SessionTracker::new();
        tracker.observe(Some(""));
        assert_eq!(tracker.last_session_id(), None);
        assert_eq!(
            tracker.continuation_for(&job(JobMode::Continue)),
            Continuation::MostRecent
        );
    }
}
