//! Progress reporting port
//!
//! Long-running steps (checksumming, copying, the tree walk) report
//! progress through a [`ProgressObserver`]. The observer answers every
//! report with a boolean; `false` asks the running operation to stop, which
//! it does by returning [`NodeError::UserCancelled`](crate::domain::NodeError).
//!
//! Cancellation is polled, not pushed: an operation only notices it at its
//! next report.

use serde::{Deserialize, Serialize};

/// What kind of work a progress report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Copy,
    Delete,
    Merge,
    Checksum,
    Sync,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Copy => "copy",
            ActionKind::Delete => "delete",
            ActionKind::Merge => "merge",
            ActionKind::Checksum => "checksum",
            ActionKind::Sync => "sync",
        };
        write!(f, "{}", s)
    }
}

/// A single progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus<'a> {
    /// Identity of the object being worked on (usually an entity path)
    pub object: &'a str,
    pub action: ActionKind,
    /// Percent of the current sub-task, 0-100
    pub subtask_percent: u8,
    /// Percent of the overall task, 0-100
    pub overall_percent: u8,
}

/// Receives progress and decides whether work continues
pub trait ProgressObserver {
    /// Returns `false` to cancel the running operation
    fn on_progress(&mut self, status: &SyncStatus<'_>) -> bool;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&SyncStatus<'_>) -> bool,
{
    fn on_progress(&mut self, status: &SyncStatus<'_>) -> bool {
        self(status)
    }
}

/// Observer that ignores reports and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _status: &SyncStatus<'_>) -> bool {
        true
    }
}

/// Integer percentage of `done` over `total`, clamped to 0-100
///
/// An empty total counts as complete.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = done.saturating_mul(100) / total;
    pct.min(100) as u8
}
