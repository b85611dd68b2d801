//! Error types for the conflict engine

use thiserror::Error;
use twinsync_core::domain::{DomainError, NodeError, SyncAction};

/// Errors that can occur during conflict resolution
#[derive(Debug, Error)]
pub enum ConflictError {
    /// A node operation failed (copy, delete, merge)
    #[error(transparent)]
    Node(#[from] NodeError),

    /// The action cannot be executed (e.g. `Unknown`)
    #[error("invalid action for resolution: {0}")]
    InvalidAction(SyncAction),

    /// The user picked an action outside the conflict's legal set
    #[error("illegal choice: {0}")]
    IllegalChoice(#[from] DomainError),
}

impl ConflictError {
    /// Returns true if the progress observer cancelled the resolution
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConflictError::Node(e) if e.is_cancelled())
    }
}
