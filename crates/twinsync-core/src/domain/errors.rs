//! Domain error types
//!
//! Two families live here:
//! - [`DomainError`]: validation failures for pure domain values
//!   (entity paths, action names).
//! - [`NodeError`]: the closed taxonomy surfaced at the syncable node
//!   boundary in place of raw OS errors.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Entity path without a recognized `file:` / `folder:` tag
    #[error("Invalid entity path: {0}")]
    InvalidEntityPath(String),

    /// Unknown action name
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised by syncable node operations
///
/// Success is `Ok(..)`; every failure is one of these variants. Only
/// [`NodeError::UserCancelled`] is a control-flow signal rather than a
/// failure, and it always propagates to the caller.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The OS refused access
    #[error("Permission denied: {0}")]
    NoPermission(PathBuf),

    /// The path exceeds the platform limit
    #[error("Path too long: {0}")]
    PathTooLong(PathBuf),

    /// The target (or one of its parents) does not exist
    #[error("Directory does not exist: {0}")]
    DirectoryDoesNotExist(PathBuf),

    /// The path could not be parsed or is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Operation has no implementation (merge)
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Delete refused because the folder is in active use
    #[error("Folder is in use: {0}")]
    IsWorkingFolder(PathBuf),

    /// A byte stream could not be opened or read
    #[error("Read error on {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    /// The progress observer asked to stop
    #[error("Operation cancelled by user")]
    UserCancelled,

    /// Argument not valid for this node or operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No free temporary name next to the destination
    #[error("No free temporary name for {path} after {attempts} attempts")]
    TempNameExhausted { path: PathBuf, attempts: u32 },

    /// Any other OS failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NodeError {
    /// Maps an OS error raised while touching `path` onto the taxonomy
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        if is_name_too_long(&err) {
            return NodeError::PathTooLong(path.to_path_buf());
        }
        match err.kind() {
            io::ErrorKind::PermissionDenied => NodeError::NoPermission(path.to_path_buf()),
            io::ErrorKind::NotFound => NodeError::DirectoryDoesNotExist(path.to_path_buf()),
            io::ErrorKind::InvalidInput => NodeError::InvalidPath(path.display().to_string()),
            _ => NodeError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Maps an OS error raised while reading `path`
    ///
    /// Permission and length problems keep their own variant; everything
    /// else becomes [`NodeError::ReadError`].
    pub fn from_read(err: io::Error, path: &Path) -> Self {
        match NodeError::from_io(err, path) {
            NodeError::Io { path, source } => NodeError::ReadError {
                path,
                reason: source.to_string(),
            },
            NodeError::DirectoryDoesNotExist(path) => NodeError::ReadError {
                path,
                reason: "not found".to_string(),
            },
            other => other,
        }
    }

    /// Returns true for the cooperative cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NodeError::UserCancelled)
    }
}

#[cfg(unix)]
fn is_name_too_long(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENAMETOOLONG)
}

#[cfg(not(unix))]
fn is_name_too_long(_err: &io::Error) -> bool {
    false
}
