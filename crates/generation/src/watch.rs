//! Client-side completion detection (the reconciliation loop).
//!
//! The status register is keyed by book, not by job, so a client that
//! dispatched work cannot look a job up directly. Instead it snapshots the
//! book at dispatch time and detects completion from observable effects:
//! an appended unit (`NextUnit`) or a changed last-unit fingerprint
//! (`RegenerateUnit`). The async polling loop lives in the infra layer; the
//! evaluation here is pure.

use serde::{Deserialize, Serialize};

use crate::request::GenerationKind;
use crate::status::{GenerationState, GenerationStatus};
use crate::unit::Unit;

/// Book state captured at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSnapshot {
    pub kind: GenerationKind,
    pub unit_count: usize,
    /// Fingerprint of the last unit, captured only for `RegenerateUnit`.
    pub last_fingerprint: Option<u64>,
}

impl WatchSnapshot {
    pub fn capture(kind: GenerationKind, units: &[Unit]) -> Self {
        let last_fingerprint = match kind {
            GenerationKind::NextUnit => None,
            GenerationKind::RegenerateUnit => units.last().map(Unit::fingerprint),
        };
        Self {
            kind,
            unit_count: units.len(),
            last_fingerprint,
        }
    }
}

/// Terminal observation of a watched generation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The dispatched work is visible in the unit list; any cached view of
    /// the book should be invalidated and re-fetched.
    Completed,
    Failed { last_error: Option<String> },
}

/// One evaluation step of the reconciliation loop.
///
/// Returns `None` while the observation is inconclusive (keep polling). The
/// status is deliberately not used as a polling gate: it may already have
/// flipped by the time the first poll runs. A `Failed` status is checked
/// first so a dead job surfaces even when counts look unchanged.
pub fn evaluate(
    snapshot: &WatchSnapshot,
    units: &[Unit],
    status: &GenerationStatus,
) -> Option<WatchOutcome> {
    if status.status == GenerationState::Failed {
        return Some(WatchOutcome::Failed {
            last_error: status.last_error.clone(),
        });
    }

    match snapshot.kind {
        GenerationKind::NextUnit => {
            if units.len() > snapshot.unit_count {
                return Some(WatchOutcome::Completed);
            }
        }
        GenerationKind::RegenerateUnit => {
            if units.len() == snapshot.unit_count {
                let current = units.last().map(Unit::fingerprint);
                if current.is_some() && current != snapshot.last_fingerprint {
                    return Some(WatchOutcome::Completed);
                }
            }
        }
    }

    None
}
