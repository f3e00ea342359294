use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use protoforge_types::{CompilationJob, CompilationResult, JobStatus};

use crate::error::{CoreError, Result};

/// Read-write-guarded map of job id -> job. Async callers poll
/// `get_status` by id rather than awaiting completion directly.
pub struct JobTracker {
    inner: RwLock<HashMap<Uuid, CompilationJob>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, language: impl Into<String>) -> Uuid {
        let mut job = CompilationJob::new(language);
        job.started_at = Some(now_millis());
        let id = job.id;
        self.inner.write().expect("job map lock poisoned").insert(id, job);
        id
    }

    pub fn get_status(&self, id: Uuid) -> Result<CompilationJob> {
        self.inner
            .read()
            .expect("job map lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(CoreError::JobNotFound(id))
    }

    pub fn mark_running(&self, id: Uuid) -> Result<()> {
        self.update(id, |job| {
            job.status = JobStatus::Running;
        })
    }

    pub fn mark_completed(&self, id: Uuid, result: CompilationResult) -> Result<()> {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.completed_at = Some(now_millis());
            job.result = Some(result);
        })
    }

    pub fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> Result<()> {
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.completed_at = Some(now_millis());
            job.error = Some(error.into());
        })
    }

    fn update(&self, id: Uuid, mutate: impl FnOnce(&mut CompilationJob)) -> Result<()> {
        let mut inner = self.inner.write().expect("job map lock poisoned");
        let job = inner.get_mut(&id).ok_or(CoreError::JobNotFound(id))?;
        mutate(job);
        Ok(())
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_status_round_trips() {
        let tracker = JobTracker::new();
        let id = tracker.create("go");
        let job = tracker.get_status(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn unknown_job_fails() {
        let tracker = JobTracker::new();
        assert!(matches!(tracker.get_status(Uuid::new_v4()), Err(CoreError::JobNotFound(_))));
    }

    #[test]
    fn completing_a_job_populates_result() {
        let tracker = JobTracker::new();
        let id = tracker.create("go");
        tracker.mark_running(id).unwrap();
        tracker.mark_completed(id, CompilationResult::failed("go", "placeholder")).unwrap();
        let job = tracker.get_status(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.result.is_some());
        assert!(job.completed_at.is_some());
    }
}
