//! Async polling loop over the pure reconciliation evaluation.
//!
//! The caller captures a [`WatchSnapshot`] before dispatching a job, then
//! awaits [`Watcher::wait`] for the terminal observation. Each tick re-reads
//! the book and evaluates; the loop ends only on a terminal outcome, so the
//! caller bounds it with its own timeout if one is needed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use bindery_core::BookId;
use bindery_generation::{evaluate, BookStore, WatchOutcome, WatchSnapshot};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls a book until a dispatched generation action is observable.
pub struct Watcher {
    books: Arc<dyn BookStore>,
    interval: Duration,
}

impl Watcher {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self {
            books,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Wait until the action captured in `snapshot` reaches a terminal
    /// observation.
    pub async fn wait(&self, book_id: BookId, snapshot: WatchSnapshot) -> WatchOutcome {
        let mut ticker = time::interval(self.interval);
        // The first tick fires immediately; a fast worker may already be done.
        loop {
            ticker.tick().await;

            let Some(book) = self.books.book(book_id) else {
                return WatchOutcome::Failed {
                    last_error: Some(format!("book {book_id} not found")),
                };
            };

            if let Some(outcome) = evaluate(&snapshot, &book.units, &book.status) {
                debug!(%book_id, ?outcome, "watch concluded");
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bindery_core::JobId;
    use bindery_generation::{GenerationKind, GenerationRequest};

    use crate::books::InMemoryBookStore;

    fn short_watcher(books: Arc<InMemoryBookStore>) -> Watcher {
        Watcher::new(books).with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn wait_resolves_once_a_unit_appears() {
        let books = Arc::new(InMemoryBookStore::new());
        let book_id = books.create("Ada's Adventure");
        let snapshot = WatchSnapshot::capture(GenerationKind::NextUnit, &[]);

        let watcher = short_watcher(Arc::clone(&books));
        let wait = tokio::spawn(async move { watcher.wait(book_id, snapshot).await });

        time::sleep(Duration::from_millis(30)).await;
        books
            .record_unit(
                &GenerationRequest::next_unit(book_id),
                JobId::new(),
                "Chapter one.".to_string(),
            )
            .unwrap();

        assert_eq!(wait.await.unwrap(), WatchOutcome::Completed);
    }

    #[tokio::test]
    async fn wait_surfaces_failure_from_the_status_register() {
        let books = Arc::new(InMemoryBookStore::new());
        let book_id = books.create("Ada's Adventure");
        let snapshot = WatchSnapshot::capture(GenerationKind::NextUnit, &[]);

        let watcher = short_watcher(Arc::clone(&books));
        let wait = tokio::spawn(async move { watcher.wait(book_id, snapshot).await });

        time::sleep(Duration::from_millis(30)).await;
        books
            .mark_failed(book_id, "attempts exhausted".to_string())
            .unwrap();

        assert_eq!(
            wait.await.unwrap(),
            WatchOutcome::Failed {
                last_error: Some("attempts exhausted".to_string())
            }
        );
    }

    #[tokio::test]
    async fn missing_book_fails_immediately() {
        let books = Arc::new(InMemoryBookStore::new());
        let snapshot = WatchSnapshot::capture(GenerationKind::NextUnit, &[]);

        let watcher = short_watcher(books);
        let outcome = watcher.wait(BookId::new(), snapshot).await;

        assert!(matches!(outcome, WatchOutcome::Failed { .. }));
    }
}
