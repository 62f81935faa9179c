//! Per-book generation status record and its lifecycle.

use serde::{Deserialize, Serialize};

/// Authoritative generation state for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// Generation status record, one per book.
///
/// `status` is the only field callers may branch on. `progress` is an
/// advisory human-readable descriptor and must not be parsed for control
/// decisions. `last_error` is populated exactly when `status` is `Failed`.
///
/// Reads are pure and safe to poll at sub-second intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub status: GenerationState,
    pub progress: Option<String>,
    pub last_error: Option<String>,
}

impl GenerationStatus {
    pub fn not_started() -> Self {
        Self {
            status: GenerationState::NotStarted,
            progress: None,
            last_error: None,
        }
    }

    /// Transition to `InProgress` (on enqueue, set by the caller).
    ///
    /// A previous `last_error` is retained: it is only cleared once the new
    /// job reaches a terminal `Completed` state.
    pub fn begin(&mut self, progress: impl Into<String>) {
        self.status = GenerationState::InProgress;
        self.progress = Some(progress.into());
    }

    /// Transition to `Completed` (set by the worker holding the job).
    pub fn complete(&mut self) {
        self.status = GenerationState::Completed;
        self.progress = None;
        self.last_error = None;
    }

    /// Transition to `Failed` (retry budget exhausted).
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = GenerationState::Failed;
        self.progress = None;
        self.last_error = Some(error.into());
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.status, GenerationState::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            GenerationState::Completed | GenerationState::Failed
        )
    }
}

impl Default for GenerationStatus {
    fn default() -> Self {
        Self::not_started()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_marks_in_progress_with_descriptor() {
        let mut status = GenerationStatus::not_started();
        status.begin("unit 1 of 1");

        assert_eq!(status.status, GenerationState::InProgress);
        assert_eq!(status.progress.as_deref(), Some("unit 1 of 1"));
        assert!(status.last_error.is_none());
    }

    #[test]
    fn complete_clears_error_and_progress() {
        let mut status = GenerationStatus::not_started();
        status.begin("unit 1 of 1");
        status.fail("model timed out");
        status.begin("unit 1 of 1");
        status.complete();

        assert_eq!(status.status, GenerationState::Completed);
        assert!(status.progress.is_none());
        assert!(status.last_error.is_none());
    }

    #[test]
    fn last_error_survives_re_enqueue_until_terminal_success() {
        let mut status = GenerationStatus::not_started();
        status.begin("unit 1 of 1");
        status.fail("model timed out");

        assert_eq!(status.status, GenerationState::Failed);
        assert!(status.last_error.is_some());

        // Re-enqueue: back to InProgress, error still visible.
        status.begin("unit 1 of 1");
        assert_eq!(status.status, GenerationState::InProgress);
        assert_eq!(status.last_error.as_deref(), Some("model timed out"));
    }

    #[test]
    fn failed_implies_last_error() {
        let mut status = GenerationStatus::not_started();
        status.begin("unit 2 of 2");
        status.fail("attempts exhausted");

        assert!(status.is_terminal());
        assert!(status.last_error.is_some());
    }
}
