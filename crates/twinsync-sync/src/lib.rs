//! twinsync Sync - Two-way tree synchronization
//!
//! Provides:
//! - The local filesystem adapter, with freedesktop trash support
//! - Glob-based exclusion of names from the tree walk
//! - Per-file and per-tree divergence detection
//! - The partnership orchestrator and its JSON store
//!
//! ## Modules
//!
//! - [`filesystem`] - Local filesystem adapter (exclusive create, trash)
//! - [`file_engine`] - Decision table for one file pair
//! - [`tree_engine`] - Breadth-first walk over both trees
//! - [`partnership`] - Sync / resolve / clean entry points
//! - [`store`] - Persisted partnership records

pub mod file_engine;
pub mod filesystem;
pub mod filter;
pub mod partnership;
pub mod store;
pub mod tree_engine;

use std::path::PathBuf;

use thiserror::Error;
use twinsync_conflict::ConflictError;
use twinsync_core::domain::{DomainError, NodeError};

pub use file_engine::{FileComparison, FileSyncEngine};
pub use filesystem::LocalFileSystemAdapter;
pub use filter::ExclusionFilter;
pub use partnership::{Partnership, PartnershipRecord};
pub use store::PartnershipStore;
pub use tree_engine::{SyncReport, TreeSyncEngine};

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// A node operation failed during the walk
    #[error(transparent)]
    Node(#[from] NodeError),

    /// A resolution failed
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// A domain-level error propagated from twinsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// One of the partnership roots is not a directory
    #[error("{side} root does not exist or is not a directory: {path}")]
    RootMissing { side: &'static str, path: PathBuf },

    /// An exclusion glob does not compile
    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The partnership store could not be read or written
    #[error("Partnership store error at {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("Partnership not found: {0}")]
    PartnershipNotFound(String),

    #[error("Partnership already exists: {0}")]
    PartnershipExists(String),
}

impl SyncError {
    /// Returns true if the progress observer cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        match self {
            SyncError::Node(e) => e.is_cancelled(),
            SyncError::Conflict(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
