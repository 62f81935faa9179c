//! The worker contract: the opaque external generation step.
//!
//! Prompt construction and model invocation are out of scope; a
//! [`UnitGenerator`] is whatever produces unit content for a request.

use thiserror::Error;

use crate::request::GenerationRequest;

/// Generation step failure. All generation failures are treated as
/// potentially transient and retried by the queue up to its attempt ceiling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("generation failed: {0}")]
    Failed(String),
}

impl GenerateError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// External content generator.
///
/// `unit_count` is the book's unit count at the time the job runs, so the
/// generator can contextualize (e.g. "write chapter 4").
pub trait UnitGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
        unit_count: usize,
    ) -> Result<String, GenerateError>;
}
