//! Job storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use bindery_core::JobId;

use super::types::{DeadLetterEntry, GenerationJob, JobStatus};

/// Job store abstraction.
pub trait JobStore: Send + Sync {
    /// Enqueue a new job.
    fn enqueue(&self, job: GenerationJob) -> Result<JobId, JobStoreError>;

    /// Get a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<GenerationJob>, JobStoreError>;

    /// Update a job.
    fn update(&self, job: &GenerationJob) -> Result<(), JobStoreError>;

    /// Claim the next pending job that is ready to execute.
    /// Returns None if no jobs are available.
    fn claim_next(&self) -> Result<Option<GenerationJob>, JobStoreError>;

    /// Move a job to the dead-letter queue.
    fn dead_letter(&self, job: GenerationJob, reason: String) -> Result<(), JobStoreError>;

    /// List dead-lettered jobs.
    fn list_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, JobStoreError>;

    /// Retry a dead-lettered job (move back to pending with a fresh budget).
    fn retry_dead_letter(&self, job_id: JobId) -> Result<GenerationJob, JobStoreError>;

    /// Get job statistics.
    fn stats(&self) -> Result<JobStats, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Job statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct JobStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// In-memory job store for tests/dev.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, GenerationJob>>,
    dead_letters: RwLock<HashMap<JobId, DeadLetterEntry>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            dead_letters: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, job: GenerationJob) -> Result<JobId, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<GenerationJob>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs.get(&job_id).cloned())
    }

    fn update(&self, job: &GenerationJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(JobStoreError::NotFound(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn claim_next(&self) -> Result<Option<GenerationJob>, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();

        // Find the oldest ready job (pending, or failed and past its backoff).
        let mut candidates: Vec<_> = jobs
            .values()
            .filter(|j| {
                matches!(j.status, JobStatus::Pending | JobStatus::Failed { .. }) && j.is_ready()
            })
            .collect();

        // Sort by created_at to ensure FIFO
        candidates.sort_by_key(|j| j.created_at);

        if let Some(job) = candidates.first() {
            let job_id = job.id;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.mark_running();
                return Ok(Some(job.clone()));
            }
        }

        Ok(None)
    }

    fn dead_letter(&self, mut job: GenerationJob, reason: String) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let mut dls = self.dead_letters.write().unwrap();

        job.status = JobStatus::DeadLettered {
            error: reason.clone(),
            attempts: job.attempt,
        };
        job.updated_at = Utc::now();

        jobs.remove(&job.id);
        dls.insert(job.id, DeadLetterEntry::new(job, reason));

        Ok(())
    }

    fn list_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, JobStoreError> {
        let dls = self.dead_letters.read().unwrap();
        let mut result: Vec<_> = dls.values().cloned().collect();

        result.sort_by_key(|e| e.dead_lettered_at);
        result.truncate(limit);
        Ok(result)
    }

    fn retry_dead_letter(&self, job_id: JobId) -> Result<GenerationJob, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let mut dls = self.dead_letters.write().unwrap();

        let entry = dls.remove(&job_id).ok_or(JobStoreError::NotFound(job_id))?;

        let mut job = entry.job;
        job.status = JobStatus::Pending;
        job.attempt = 0;
        job.scheduled_at = None;
        job.updated_at = Utc::now();
        job.history.clear();

        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        let dls = self.dead_letters.read().unwrap();

        let mut stats = JobStats::default();

        for job in jobs.values() {
            match &job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed { .. } => stats.failed += 1,
                JobStatus::DeadLettered { .. } => stats.dead_lettered += 1,
            }
        }

        stats.dead_lettered += dls.len();

        Ok(stats)
    }
}

impl JobStore for Arc<InMemoryJobStore> {
    fn enqueue(&self, job: GenerationJob) -> Result<JobId, JobStoreError> {
        (**self).enqueue(job)
    }

    fn get(&self, job_id: JobId) -> Result<Option<GenerationJob>, JobStoreError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &GenerationJob) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn claim_next(&self) -> Result<Option<GenerationJob>, JobStoreError> {
        (**self).claim_next()
    }

    fn dead_letter(&self, job: GenerationJob, reason: String) -> Result<(), JobStoreError> {
        (**self).dead_letter(job, reason)
    }

    fn list_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, JobStoreError> {
        (**self).list_dead_letters(limit)
    }

    fn retry_dead_letter(&self, job_id: JobId) -> Result<GenerationJob, JobStoreError> {
        (**self).retry_dead_letter(job_id)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        (**self).stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::BookId;
    use bindery_generation::GenerationRequest;

    fn job() -> GenerationJob {
        GenerationJob::new(GenerationRequest::next_unit(BookId::new()))
    }

    #[test]
    fn enqueue_and_claim() {
        let store = InMemoryJobStore::new();

        let job_id = store.enqueue(job()).unwrap();

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, job_id);
        assert!(matches!(claimed.status, JobStatus::Running));
        assert_eq!(claimed.attempt, 1);

        // No more jobs
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn claim_is_fifo_by_creation() {
        let store = InMemoryJobStore::new();

        let first = store.enqueue(job()).unwrap();
        let second = store.enqueue(job()).unwrap();

        assert_eq!(store.claim_next().unwrap().unwrap().id, first);
        assert_eq!(store.claim_next().unwrap().unwrap().id, second);
    }

    #[test]
    fn backoff_delays_are_respected_by_claim() {
        let store = InMemoryJobStore::new();
        let job_id = store.enqueue(job()).unwrap();

        let mut claimed = store.claim_next().unwrap().unwrap();
        claimed.mark_failed("transient".to_string(), Utc::now());
        store.update(&claimed).unwrap();

        // Still inside the backoff window: not claimable.
        assert!(store.claim_next().unwrap().is_none());

        claimed.scheduled_at = Some(Utc::now() - chrono::Duration::seconds(1));
        store.update(&claimed).unwrap();
        assert_eq!(store.claim_next().unwrap().unwrap().id, job_id);
    }

    #[test]
    fn dead_letter_flow() {
        let store = InMemoryJobStore::new();

        let queued = job();
        let job_id = queued.id;
        store.enqueue(queued).unwrap();

        let mut claimed = store.claim_next().unwrap().unwrap();
        claimed.mark_failed("test error".to_string(), Utc::now());

        store
            .dead_letter(claimed, "max retries exceeded".to_string())
            .unwrap();

        // Job is no longer in main queue
        assert!(store.get(job_id).unwrap().is_none());

        // Job is in DLQ
        let dls = store.list_dead_letters(10).unwrap();
        assert_eq!(dls.len(), 1);
        assert_eq!(dls[0].job.id, job_id);

        // Retry the job
        let retried = store.retry_dead_letter(job_id).unwrap();
        assert!(matches!(retried.status, JobStatus::Pending));
        assert_eq!(retried.attempt, 0);

        // DLQ is now empty
        let dls = store.list_dead_letters(10).unwrap();
        assert!(dls.is_empty());
    }

    #[test]
    fn stats_tracking() {
        let store = InMemoryJobStore::new();

        for _ in 0..5 {
            store.enqueue(job()).unwrap();
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.pending, 5);

        store.claim_next().unwrap();
        store.claim_next().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.running, 2);
    }
}
