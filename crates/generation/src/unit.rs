//! Generated content units.

use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bindery_core::JobId;

/// One generated content element of a book (a chapter or illustrated page).
///
/// `source_job_id` records which job produced the current content; it is the
/// idempotency anchor for at-least-once job redelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub index: u32,
    pub content: String,
    pub source_job_id: JobId,
    pub generated_at: DateTime<Utc>,
}

impl Unit {
    pub fn new(index: u32, content: impl Into<String>, source_job_id: JobId) -> Self {
        Self {
            index,
            content: content.into(),
            source_job_id,
            generated_at: Utc::now(),
        }
    }

    /// Opaque change detector for this unit's content.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.content)
    }
}

/// Content fingerprint used by the reconciliation loop to detect that a unit
/// was replaced. Not a cryptographic digest; only equality matters.
pub fn fingerprint(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_equal_content() {
        assert_eq!(fingerprint("chapter one"), fingerprint("chapter one"));
    }

    #[test]
    fn fingerprint_changes_when_content_changes() {
        assert_ne!(fingerprint("chapter one"), fingerprint("chapter one, revised"));
    }
}
