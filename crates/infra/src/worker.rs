//! Job handler wiring the queue to the generator and the book store.

use std::sync::Arc;

use tracing::{info, warn};

use bindery_generation::{BookStore, UnitGenerator};

use crate::jobs::{GenerationJob, JobHandler, JobResult};

/// Runs claimed generation jobs: generate content, persist the unit, flip the
/// book's status register.
pub struct GenerationWorker {
    generator: Arc<dyn UnitGenerator>,
    books: Arc<dyn BookStore>,
}

impl GenerationWorker {
    pub fn new(generator: Arc<dyn UnitGenerator>, books: Arc<dyn BookStore>) -> Self {
        Self { generator, books }
    }
}

impl JobHandler for GenerationWorker {
    fn run(&self, job: &GenerationJob) -> JobResult {
        let book_id = job.request.book_id;

        // Redelivered job whose write already landed: succeed without
        // generating again.
        if self.books.has_unit_from_job(book_id, job.id) {
            info!(job_id = %job.id, book_id = %book_id, "job already applied, skipping");
            return JobResult::Success;
        }

        let Some(book) = self.books.book(book_id) else {
            return JobResult::Failure(format!("book {book_id} not found"));
        };

        let content = match self.generator.generate(&job.request, book.unit_count()) {
            Ok(content) => content,
            Err(err) => return JobResult::Failure(err.to_string()),
        };

        match self.books.record_unit(&job.request, job.id, content) {
            Ok(()) => JobResult::Success,
            Err(err) => JobResult::Failure(err.to_string()),
        }
    }

    fn exhausted(&self, job: &GenerationJob, error: &str) {
        warn!(
            job_id = %job.id,
            book_id = %job.request.book_id,
            error,
            "generation attempts exhausted, marking book failed"
        );
        if let Err(err) = self.books.mark_failed(job.request.book_id, error.to_string()) {
            warn!(book_id = %job.request.book_id, %err, "failed to record failure status");
        }
    }
}
