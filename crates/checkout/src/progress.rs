//! Progress events published while a checkout is processing.

use serde::{Deserialize, Serialize};

use bindery_core::BookId;

/// One event on the progress channel.
///
/// Step events are published strictly in execution order, each before its
/// step starts; exactly one error event precedes a failed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Step {
        step: u32,
        total_steps: u32,
        message: String,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    pub fn step(step: u32, total_steps: u32, message: impl Into<String>) -> Self {
        Self::Step {
            step,
            total_steps,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Fire-and-forget event sink, keyed by the owning book's room.
///
/// Delivery is best-effort and at-most-once; publishers must never block on
/// or depend on a subscriber receiving anything.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, book_id: BookId, event: ProgressEvent);
}

/// Sink that drops every event (tests, headless use).
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _book_id: BookId, _event: ProgressEvent) {}
}

impl<S> ProgressSink for std::sync::Arc<S>
where
    S: ProgressSink + ?Sized,
{
    fn publish(&self, book_id: BookId, event: ProgressEvent) {
        (**self).publish(book_id, event)
    }
}
