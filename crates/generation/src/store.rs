//! Storage seam for books, units, and the status register.
//!
//! Persistent storage is an external collaborator; this trait is the contract
//! the orchestrator relies on. The write operations taken by a worker
//! (`record_unit`, `mark_failed`) must be atomic with respect to the book they
//! touch: a reader never observes a new unit without the matching status.

use bindery_core::{BookId, DomainResult, JobId};

use crate::request::GenerationRequest;
use crate::status::GenerationStatus;
use crate::unit::Unit;

/// Read-consistent snapshot of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSnapshot {
    pub id: BookId,
    pub title: String,
    pub units: Vec<Unit>,
    pub status: GenerationStatus,
}

impl BookSnapshot {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// Book + status register store.
pub trait BookStore: Send + Sync {
    /// Full snapshot of a book (the reconciliation-loop read).
    fn book(&self, id: BookId) -> Option<BookSnapshot>;

    /// Status-only read, safe at high frequency.
    fn status(&self, id: BookId) -> Option<GenerationStatus>;

    /// Flip the status register to `InProgress` (caller-side, on enqueue).
    ///
    /// Refuses with a conflict while another generation is in flight for the
    /// book; the check and the flip are atomic.
    fn begin_generation(&self, id: BookId, progress: String) -> DomainResult<()>;

    /// Apply a produced unit and mark the book `Completed`, atomically.
    ///
    /// Idempotent under job redelivery: if `job_id` already produced this
    /// book's content, the call is a no-op.
    fn record_unit(
        &self,
        request: &GenerationRequest,
        job_id: JobId,
        content: String,
    ) -> DomainResult<()>;

    /// Whether `job_id` has already been applied to the book.
    fn has_unit_from_job(&self, id: BookId, job_id: JobId) -> bool;

    /// Flip the status register to `Failed` with `last_error` (retry budget
    /// exhausted).
    fn mark_failed(&self, id: BookId, error: String) -> DomainResult<()>;
}
