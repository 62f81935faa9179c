//! Background generation job queue with retry, backoff, and dead-letter
//! handling.
//!
//! ## Design
//!
//! - Jobs carry a typed [`GenerationRequest`](bindery_generation::GenerationRequest)
//! - At-least-once execution; handlers must be idempotent
//! - Exponential backoff, retry ceiling fixed at 3 attempts
//! - Dead-letter queue for jobs that exhaust their budget
//! - Visibility into job status and failures
//!
//! ## Components
//!
//! - `GenerationJob`: the queued unit of work with its retry budget
//! - `JobStore`: persistence for jobs (in-memory here; durable elsewhere)
//! - `JobExecutor`: claims and runs jobs with retry logic

pub mod executor;
pub mod store;
pub mod types;

pub use executor::{JobExecutor, JobExecutorConfig, JobExecutorHandle, JobHandler};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{
    BackoffStrategy, DeadLetterEntry, GenerationJob, JobResult, JobStatus, RetryPolicy,
};
