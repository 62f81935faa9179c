//! Infrastructure layer: job queue, worker glue, in-memory stores, progress
//! rooms, and the async watcher.

pub mod books;
pub mod gateways;
pub mod jobs;
pub mod rooms;
pub mod watch;
pub mod worker;

#[cfg(test)]
mod integration_tests;
