//! Per-book progress rooms over tokio broadcast channels.
//!
//! Each book with at least one subscriber has a room; publishing to a book
//! without a room drops the event. Subscribers only see events published
//! after they joined.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use bindery_checkout::{ProgressEvent, ProgressSink};
use bindery_core::BookId;

const ROOM_CAPACITY: usize = 64;

/// Registry of live progress rooms.
#[derive(Debug, Default)]
pub struct ProgressRooms {
    rooms: RwLock<HashMap<BookId, broadcast::Sender<ProgressEvent>>>,
}

impl ProgressRooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a book's room, creating it if absent.
    pub fn join(&self, book_id: BookId) -> broadcast::Receiver<ProgressEvent> {
        let mut rooms = self.rooms.write().unwrap();
        rooms
            .entry(book_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscribers in a book's room.
    pub fn subscriber_count(&self, book_id: BookId) -> usize {
        let rooms = self.rooms.read().unwrap();
        rooms
            .get(&book_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl ProgressSink for ProgressRooms {
    fn publish(&self, book_id: BookId, event: ProgressEvent) {
        let mut rooms = self.rooms.write().unwrap();
        let Some(tx) = rooms.get(&book_id) else {
            debug!(%book_id, "progress event dropped, no room");
            return;
        };
        if tx.send(event).is_err() {
            // Last receiver is gone; drop the room.
            rooms.remove(&book_id);
        }
    }
}
