//! Job executor with retry and backoff logic.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::store::{JobStore, JobStoreError};
use super::types::{GenerationJob, JobResult, JobStatus};

/// Job handler: runs one claimed job.
///
/// `run` is invoked at least once per job and must be idempotent under
/// redelivery. `exhausted` fires once, after the job's final attempt has
/// failed and the job has been dead-lettered; this is where the owning
/// entity's status is flipped to failed.
pub trait JobHandler: Send + Sync {
    fn run(&self, job: &GenerationJob) -> JobResult;

    fn exhausted(&self, _job: &GenerationJob, _error: &str) {}
}

/// Job executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How often to poll for new jobs
    pub poll_interval: Duration,
    /// Name for logging
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "job-executor".to_string(),
        }
    }
}

impl JobExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct JobExecutorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Get current executor statistics.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Executor runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_dead_lettered: u64,
    pub uptime_secs: u64,
}

/// Background job executor.
///
/// Polls a job store for ready jobs, runs them through the handler, and
/// applies the retry/backoff/dead-letter policy.
pub struct JobExecutor<S: JobStore> {
    store: S,
    handler: Box<dyn JobHandler>,
}

impl<S: JobStore + 'static> JobExecutor<S> {
    pub fn new(store: S, handler: Box<dyn JobHandler>) -> Self {
        Self { store, handler }
    }

    /// Spawn the executor in a background thread.
    pub fn spawn(self, config: JobExecutorConfig) -> JobExecutorHandle
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let stats_clone = stats.clone();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || {
                executor_loop(self, config, shutdown_rx, stats_clone);
            })
            .expect("failed to spawn job executor thread");

        JobExecutorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }

    /// Execute a single claimed job (for testing or synchronous use).
    pub fn execute_one(&self, job: &mut GenerationJob) -> Result<(), String> {
        execute_job(self, job)
    }
}

fn executor_loop<S: JobStore>(
    executor: JobExecutor<S>,
    config: JobExecutorConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<ExecutorStats>>,
) {
    info!(executor = %config.name, "job executor started");
    let start_time = Instant::now();

    loop {
        // Check for shutdown
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        {
            let mut s = stats.lock().unwrap();
            s.uptime_secs = start_time.elapsed().as_secs();
        }

        // Try to claim a job
        match executor.store.claim_next() {
            Ok(Some(mut job)) => {
                debug!(
                    executor = %config.name,
                    job_id = %job.id,
                    request = ?job.request,
                    attempt = job.attempt,
                    "claimed job"
                );

                let result = execute_job(&executor, &mut job);

                {
                    let mut s = stats.lock().unwrap();
                    s.jobs_processed += 1;
                    match result {
                        Ok(()) => s.jobs_succeeded += 1,
                        Err(_) => {
                            s.jobs_failed += 1;
                            if matches!(job.status, JobStatus::DeadLettered { .. }) {
                                s.jobs_dead_lettered += 1;
                            }
                        }
                    }
                }

                if let Err(e) = result {
                    debug!(
                        executor = %config.name,
                        job_id = %job.id,
                        error = %e,
                        status = ?job.status,
                        "job execution failed"
                    );
                }
            }
            Ok(None) => {
                // No jobs available, sleep
                thread::sleep(config.poll_interval);
            }
            Err(e) => {
                error!(executor = %config.name, error = ?e, "failed to claim job");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(executor = %config.name, "job executor stopped");
}

fn execute_job<S: JobStore>(
    executor: &JobExecutor<S>,
    job: &mut GenerationJob,
) -> Result<(), String> {
    let started = Utc::now();

    match executor.handler.run(job) {
        JobResult::Success => {
            job.mark_completed(started);
            executor.store.update(job).map_err(store_err)?;
            debug!(job_id = %job.id, "job completed successfully");
            Ok(())
        }
        JobResult::Failure(error) => {
            job.mark_failed(error.clone(), started);
            executor.store.update(job).map_err(store_err)?;

            if matches!(job.status, JobStatus::DeadLettered { .. }) {
                warn!(job_id = %job.id, error = %error, "job dead-lettered");
                executor
                    .store
                    .dead_letter(job.clone(), error.clone())
                    .map_err(store_err)?;
                executor.handler.exhausted(job, &error);
            }

            Err(error)
        }
    }
}

fn store_err(e: JobStoreError) -> String {
    e.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::jobs::store::InMemoryJobStore;
    use crate::jobs::types::RetryPolicy;
    use bindery_core::BookId;
    use bindery_generation::GenerationRequest;

    struct ScriptedHandler {
        failures_before_success: u32,
        runs: AtomicU32,
        exhausted: AtomicU32,
    }

    impl ScriptedHandler {
        fn new(failures_before_success: u32) -> Self {
            Self {
                failures_before_success,
                runs: AtomicU32::new(0),
                exhausted: AtomicU32::new(0),
            }
        }
    }

    impl JobHandler for ScriptedHandler {
        fn run(&self, _job: &GenerationJob) -> JobResult {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run < self.failures_before_success {
                JobResult::Failure(format!("scripted failure {}", run + 1))
            } else {
                JobResult::Success
            }
        }

        fn exhausted(&self, _job: &GenerationJob, _error: &str) {
            self.exhausted.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enqueue(store: &InMemoryJobStore, max_attempts: u32) -> bindery_core::JobId {
        let job = GenerationJob::new(GenerationRequest::next_unit(BookId::new()))
            .with_retry_policy(RetryPolicy {
                max_attempts,
                ..RetryPolicy::generation()
            });
        store.enqueue(job).unwrap()
    }

    fn drain(store: &Arc<InMemoryJobStore>, executor: &JobExecutor<Arc<InMemoryJobStore>>) {
        // Run claimed jobs to completion, skipping backoff windows.
        loop {
            match store.claim_next().unwrap() {
                Some(mut job) => {
                    let _ = executor.execute_one(&mut job);
                    if let Ok(Some(mut stored)) = store.get(job.id) {
                        if stored.scheduled_at.is_some() {
                            stored.scheduled_at = None;
                            store.update(&stored).unwrap();
                        }
                    }
                }
                None => break,
            }
        }
    }

    #[test]
    fn execute_successful_job() {
        let store = InMemoryJobStore::arc();
        let executor = JobExecutor::new(store.clone(), Box::new(ScriptedHandler::new(0)));

        enqueue(&store, 3);

        let mut claimed = store.claim_next().unwrap().unwrap();
        let result = executor.execute_one(&mut claimed);

        assert!(result.is_ok());
        assert!(matches!(claimed.status, JobStatus::Completed));
    }

    #[test]
    fn failing_job_is_retried_then_dead_lettered() {
        let store = InMemoryJobStore::arc();
        let handler = Arc::new(ScriptedHandler::new(u32::MAX));

        struct Shared(Arc<ScriptedHandler>);
        impl JobHandler for Shared {
            fn run(&self, job: &GenerationJob) -> JobResult {
                self.0.run(job)
            }
            fn exhausted(&self, job: &GenerationJob, error: &str) {
                self.0.exhausted(job, error)
            }
        }

        let executor = JobExecutor::new(store.clone(), Box::new(Shared(handler.clone())));
        let job_id = enqueue(&store, 2);

        drain(&store, &executor);

        assert_eq!(handler.runs.load(Ordering::SeqCst), 2);
        assert_eq!(handler.exhausted.load(Ordering::SeqCst), 1);
        assert!(store.get(job_id).unwrap().is_none());
        assert_eq!(store.list_dead_letters(10).unwrap().len(), 1);
    }

    #[test]
    fn third_attempt_success_stays_out_of_the_dlq() {
        let store = InMemoryJobStore::arc();
        let handler = Arc::new(ScriptedHandler::new(2));

        struct Shared(Arc<ScriptedHandler>);
        impl JobHandler for Shared {
            fn run(&self, job: &GenerationJob) -> JobResult {
                self.0.run(job)
            }
            fn exhausted(&self, job: &GenerationJob, error: &str) {
                self.0.exhausted(job, error)
            }
        }

        let executor = JobExecutor::new(store.clone(), Box::new(Shared(handler.clone())));
        let job_id = enqueue(&store, 3);

        drain(&store, &executor);

        assert_eq!(handler.runs.load(Ordering::SeqCst), 3);
        assert_eq!(handler.exhausted.load(Ordering::SeqCst), 0);
        assert!(matches!(
            store.get(job_id).unwrap().unwrap().status,
            JobStatus::Completed
        ));
        assert!(store.list_dead_letters(10).unwrap().is_empty());
    }

    #[test]
    fn spawned_executor_processes_and_shuts_down() {
        let store = InMemoryJobStore::arc();
        let executor = JobExecutor::new(store.clone(), Box::new(ScriptedHandler::new(0)));

        let job_id = enqueue(&store, 3);

        let handle = executor.spawn(
            JobExecutorConfig::default()
                .with_name("test-executor")
                .with_poll_interval(Duration::from_millis(5)),
        );

        // Wait for the background thread to pick the job up.
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if matches!(
                store.get(job_id).unwrap().map(|j| j.status),
                Some(JobStatus::Completed)
            ) {
                break;
            }
            assert!(Instant::now() < deadline, "job never completed");
            thread::sleep(Duration::from_millis(5));
        }

        let stats = handle.stats();
        assert_eq!(stats.jobs_succeeded, 1);

        handle.shutdown();
    }
}
