//! End-to-end flows across the queue, the worker, and the book store.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::books::InMemoryBookStore;
use crate::jobs::{
    GenerationJob, InMemoryJobStore, JobExecutor, JobResult, JobStore, RetryPolicy,
};
use crate::worker::GenerationWorker;

use bindery_core::{BookId, DomainError};
use bindery_generation::{
    BookStore, GenerateError, GenerationRequest, GenerationState, UnitGenerator,
};

/// Generator scripted to fail a fixed number of times before succeeding.
struct ScriptedGenerator {
    failures_before_success: u32,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    fn new(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            calls: AtomicU32::new(0),
        }
    }
}

impl UnitGenerator for ScriptedGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
        unit_count: usize,
    ) -> Result<String, GenerateError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures_before_success {
            return Err(GenerateError::failed(format!("model timed out ({})", call + 1)));
        }
        Ok(format!(
            "Generated content for {:?} (book has {} units)",
            request.kind, unit_count
        ))
    }
}

struct World {
    books: Arc<InMemoryBookStore>,
    jobs: Arc<InMemoryJobStore>,
    executor: JobExecutor<Arc<InMemoryJobStore>>,
}

fn world(failures_before_success: u32) -> World {
    let books = Arc::new(InMemoryBookStore::new());
    let jobs = InMemoryJobStore::arc();
    let generator = Arc::new(ScriptedGenerator::new(failures_before_success));
    let worker = GenerationWorker::new(generator, books.clone() as Arc<dyn BookStore>);
    let executor = JobExecutor::new(jobs.clone(), Box::new(worker));
    World {
        books,
        jobs,
        executor,
    }
}

/// Enqueue a request the way the dispatch path does: status first, then job.
fn dispatch(w: &World, book_id: BookId, request: GenerationRequest) -> bindery_core::JobId {
    let book = w.books.book(book_id).unwrap();
    request.validate(book.unit_count()).unwrap();
    w.books
        .begin_generation(book_id, request.progress_descriptor(book.unit_count()))
        .unwrap();
    w.jobs
        .enqueue(GenerationJob::new(request).with_retry_policy(RetryPolicy::generation()))
        .unwrap()
}

/// Drain the queue synchronously, collapsing backoff windows.
fn drain(w: &World) {
    loop {
        match w.jobs.claim_next().unwrap() {
            Some(mut job) => {
                let _ = w.executor.execute_one(&mut job);
                if let Ok(Some(mut stored)) = w.jobs.get(job.id) {
                    if stored.scheduled_at.is_some() {
                        stored.scheduled_at = None;
                        w.jobs.update(&stored).unwrap();
                    }
                }
            }
            None => break,
        }
    }
}

#[test]
fn dispatch_flips_status_before_the_worker_runs() {
    let w = world(0);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));

    let status = w.books.status(book_id).unwrap();
    assert_eq!(status.status, GenerationState::InProgress);
    assert_eq!(status.progress.as_deref(), Some("unit 1 of 1"));
}

#[test]
fn next_unit_flow_appends_and_completes() {
    let w = world(0);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);

    let book = w.books.book(book_id).unwrap();
    assert_eq!(book.unit_count(), 1);
    assert_eq!(book.status.status, GenerationState::Completed);
    assert!(book.status.last_error.is_none());
}

#[test]
fn transient_failures_are_retried_to_success() {
    let w = world(2);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);

    // Two failures, then success on the third attempt: one unit, no error.
    let book = w.books.book(book_id).unwrap();
    assert_eq!(book.unit_count(), 1);
    assert_eq!(book.status.status, GenerationState::Completed);
    assert!(book.status.last_error.is_none());
    assert!(w.jobs.list_dead_letters(10).unwrap().is_empty());
}

#[test]
fn exhausted_retries_mark_the_book_failed() {
    let w = world(u32::MAX);
    let book_id = w.books.create("Ada's Adventure");

    let job_id = dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);

    let book = w.books.book(book_id).unwrap();
    assert_eq!(book.unit_count(), 0);
    assert_eq!(book.status.status, GenerationState::Failed);
    // The worker records the generator error with its context line intact.
    assert_eq!(
        book.status.last_error.as_deref(),
        Some("generation failed: model timed out (3)")
    );

    assert!(w.jobs.get(job_id).unwrap().is_none());
    assert_eq!(w.jobs.list_dead_letters(10).unwrap().len(), 1);
}

#[test]
fn second_dispatch_is_refused_while_one_is_in_flight() {
    let w = world(0);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    assert!(matches!(
        w.books.begin_generation(book_id, "unit 1 of 1".to_string()),
        Err(DomainError::Conflict(_))
    ));

    drain(&w);

    // Completion reopens dispatch.
    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);
    assert_eq!(w.books.book(book_id).unwrap().unit_count(), 2);
}

#[test]
fn dead_letter_retry_reenters_in_progress_and_runs_again() {
    let w = world(3);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);
    assert_eq!(
        w.books.status(book_id).unwrap().status,
        GenerationState::Failed
    );

    let entry_id = w.jobs.list_dead_letters(1).unwrap()[0].job.id;
    let job = w.jobs.retry_dead_letter(entry_id).unwrap();

    // Requeue flips the book back to in-progress, the way the admin
    // endpoint does, so watchers and dispatchers see an active job.
    let book = w.books.book(book_id).unwrap();
    w.books
        .begin_generation(book_id, job.request.progress_descriptor(book.unit_count()))
        .unwrap();
    let status = w.books.status(book_id).unwrap();
    assert_eq!(status.status, GenerationState::InProgress);
    assert!(status.last_error.is_some());

    drain(&w);
    let book = w.books.book(book_id).unwrap();
    assert_eq!(book.unit_count(), 1);
    assert_eq!(book.status.status, GenerationState::Completed);
}

#[test]
fn regenerate_replaces_the_target_without_changing_the_count() {
    let w = world(0);
    let book_id = w.books.create("Ada's Adventure");
    w.books.seed_unit(book_id, "chapter one").unwrap();
    w.books.seed_unit(book_id, "chapter two").unwrap();

    dispatch(&w, book_id, GenerationRequest::regenerate_unit(book_id, 0));
    drain(&w);

    let book = w.books.book(book_id).unwrap();
    assert_eq!(book.unit_count(), 2);
    assert!(book.units[0].content.starts_with("Generated content"));
    assert_eq!(book.units[1].content, "chapter two");
    assert_eq!(book.status.status, GenerationState::Completed);
}

#[test]
fn redelivered_job_does_not_duplicate_the_unit() {
    let w = world(0);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));

    let mut job = w.jobs.claim_next().unwrap().unwrap();
    w.executor.execute_one(&mut job).unwrap();
    assert_eq!(w.books.book(book_id).unwrap().unit_count(), 1);

    // Simulate redelivery of the same job.
    let outcome = {
        let generator = Arc::new(ScriptedGenerator::new(0));
        let worker = GenerationWorker::new(generator, w.books.clone() as Arc<dyn BookStore>);
        use crate::jobs::JobHandler;
        worker.run(&job)
    };

    assert!(matches!(outcome, JobResult::Success));
    assert_eq!(w.books.book(book_id).unwrap().unit_count(), 1);
}

#[test]
fn failure_error_is_retained_through_a_re_dispatch() {
    let w = world(u32::MAX);
    let book_id = w.books.create("Ada's Adventure");

    dispatch(&w, book_id, GenerationRequest::next_unit(book_id));
    drain(&w);
    assert_eq!(
        w.books.status(book_id).unwrap().status,
        GenerationState::Failed
    );

    // The client enqueues again: InProgress, previous error still readable.
    w.books
        .begin_generation(book_id, "unit 1 of 1".to_string())
        .unwrap();
    let status = w.books.status(book_id).unwrap();
    assert_eq!(status.status, GenerationState::InProgress);
    assert!(status.last_error.is_some());
}
