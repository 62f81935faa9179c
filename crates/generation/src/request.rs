//! Generation job requests.

use serde::{Deserialize, Serialize};

use bindery_core::{BookId, DomainError, DomainResult};

/// What a generation job should do to the owning book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Append a new unit after the current last one.
    NextUnit,
    /// Replace the unit at `target_index` with freshly generated content.
    RegenerateUnit,
}

/// Payload of a queued generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub book_id: BookId,
    pub kind: GenerationKind,
    /// Required (and bounds-checked) for `RegenerateUnit`; absent otherwise.
    pub target_index: Option<u32>,
}

impl GenerationRequest {
    pub fn next_unit(book_id: BookId) -> Self {
        Self {
            book_id,
            kind: GenerationKind::NextUnit,
            target_index: None,
        }
    }

    pub fn regenerate_unit(book_id: BookId, target_index: u32) -> Self {
        Self {
            book_id,
            kind: GenerationKind::RegenerateUnit,
            target_index: Some(target_index),
        }
    }

    /// Validate the request against the book's current unit count.
    ///
    /// Rejected requests have no side effects and are never enqueued.
    pub fn validate(&self, unit_count: usize) -> DomainResult<()> {
        match self.kind {
            GenerationKind::NextUnit => Ok(()),
            GenerationKind::RegenerateUnit => match self.target_index {
                None => Err(DomainError::validation(
                    "target_index is required for regenerate_unit",
                )),
                Some(index) if (index as usize) >= unit_count => Err(DomainError::validation(
                    format!("target_index {index} out of range (book has {unit_count} units)"),
                )),
                Some(_) => Ok(()),
            },
        }
    }

    /// Advisory progress descriptor for the status record.
    pub fn progress_descriptor(&self, unit_count: usize) -> String {
        match self.kind {
            GenerationKind::NextUnit => {
                format!("unit {} of {}", unit_count + 1, unit_count + 1)
            }
            GenerationKind::RegenerateUnit => {
                let index = self.target_index.unwrap_or_default();
                format!("unit {} of {}", index + 1, unit_count)
            }
        }
    }
}
