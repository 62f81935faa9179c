//! Generation domain: per-book status lifecycle, generated units, job
//! requests, the worker contract, and client-side completion detection.
//!
//! The AI generation step itself is an external collaborator behind
//! [`UnitGenerator`]; storage is an external collaborator behind [`BookStore`].

pub mod request;
pub mod status;
pub mod store;
pub mod unit;
pub mod watch;
pub mod worker;

pub use request::{GenerationKind, GenerationRequest};
pub use status::{GenerationState, GenerationStatus};
pub use store::{BookSnapshot, BookStore};
pub use unit::{fingerprint, Unit};
pub use watch::{evaluate, WatchOutcome, WatchSnapshot};
pub use worker::{GenerateError, UnitGenerator};
