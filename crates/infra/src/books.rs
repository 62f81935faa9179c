//! In-memory book store: unit lists plus the generation status register.
//!
//! Stands in for external storage in dev and tests. One `RwLock` guards each
//! book's units and status together, which is what makes worker writes
//! (`record_unit`, `mark_failed`) atomic from a reader's point of view.

use std::collections::HashMap;
use std::sync::RwLock;

use bindery_core::{BookId, DomainError, DomainResult, JobId};
use bindery_generation::{
    BookSnapshot, BookStore, GenerationKind, GenerationRequest, GenerationStatus, Unit,
};

#[derive(Debug, Clone)]
struct BookRecord {
    title: String,
    units: Vec<Unit>,
    status: GenerationStatus,
}

#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<HashMap<BookId, BookRecord>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, title: impl Into<String>) -> BookId {
        let id = BookId::new();
        self.books.write().unwrap().insert(
            id,
            BookRecord {
                title: title.into(),
                units: Vec::new(),
                status: GenerationStatus::not_started(),
            },
        );
        id
    }

    /// Append a unit directly, bypassing the queue. Dev/test seeding only.
    pub fn seed_unit(&self, id: BookId, content: impl Into<String>) -> DomainResult<()> {
        let mut books = self.books.write().unwrap();
        let record = books.get_mut(&id).ok_or(DomainError::NotFound)?;
        let index = record.units.len() as u32;
        record.units.push(Unit::new(index, content, JobId::new()));
        Ok(())
    }
}

impl BookStore for InMemoryBookStore {
    fn book(&self, id: BookId) -> Option<BookSnapshot> {
        let books = self.books.read().unwrap();
        books.get(&id).map(|record| BookSnapshot {
            id,
            title: record.title.clone(),
            units: record.units.clone(),
            status: record.status.clone(),
        })
    }

    fn status(&self, id: BookId) -> Option<GenerationStatus> {
        let books = self.books.read().unwrap();
        books.get(&id).map(|record| record.status.clone())
    }

    fn begin_generation(&self, id: BookId, progress: String) -> DomainResult<()> {
        let mut books = self.books.write().unwrap();
        let record = books.get_mut(&id).ok_or(DomainError::NotFound)?;
        // One in-flight generation per book, decided under the write lock so
        // concurrent dispatches cannot both pass.
        if record.status.is_in_progress() {
            return Err(DomainError::conflict(
                "a generation job is already running for this book",
            ));
        }
        record.status.begin(progress);
        Ok(())
    }

    fn record_unit(
        &self,
        request: &GenerationRequest,
        job_id: JobId,
        content: String,
    ) -> DomainResult<()> {
        let mut books = self.books.write().unwrap();
        let record = books
            .get_mut(&request.book_id)
            .ok_or(DomainError::NotFound)?;

        // At-least-once redelivery: a job that already landed is a no-op.
        if record.units.iter().any(|u| u.source_job_id == job_id) {
            return Ok(());
        }

        match request.kind {
            GenerationKind::NextUnit => {
                let index = record.units.len() as u32;
                record.units.push(Unit::new(index, content, job_id));
            }
            GenerationKind::RegenerateUnit => {
                let index = request.target_index.ok_or_else(|| {
                    DomainError::invariant("regenerate job without target_index")
                })? as usize;
                let unit = record.units.get_mut(index).ok_or_else(|| {
                    DomainError::invariant(format!("regenerate target {index} out of range"))
                })?;
                *unit = Unit::new(index as u32, content, job_id);
            }
        }

        record.status.complete();
        Ok(())
    }

    fn has_unit_from_job(&self, id: BookId, job_id: JobId) -> bool {
        let books = self.books.read().unwrap();
        books
            .get(&id)
            .map(|record| record.units.iter().any(|u| u.source_job_id == job_id))
            .unwrap_or(false)
    }

    fn mark_failed(&self, id: BookId, error: String) -> DomainResult<()> {
        let mut books = self.books.write().unwrap();
        let record = books.get_mut(&id).ok_or(DomainError::NotFound)?;
        record.status.fail(error);
        Ok(())
    }
}
