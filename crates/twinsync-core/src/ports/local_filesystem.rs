//! Local filesystem port (driven/secondary port)
//!
//! This module defines the only interface the sync core uses to touch
//! storage: existence and metadata queries, directory listings, byte
//! streams, and copy/move/delete primitives with an optional recoverable
//! (trash) mode.
//!
//! ## Design Notes
//!
//! - Uses `std::io::Result` so the node layer can map OS error kinds onto
//!   the closed [`NodeError`](crate::domain::NodeError) taxonomy.
//! - Calls are synchronous; a sync runs sequentially on the caller's thread.
//! - Listings return bare names, not full paths, in no particular order.

use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

// ============================================================================
// FileSystemState
// ============================================================================

/// Snapshot of a path's state on the filesystem
///
/// Captures the metadata the engines compare: presence, kind, length and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemState {
    /// Whether the file/directory exists on disk
    pub exists: bool,
    /// Whether this is a regular file (false for directories and other types)
    pub is_file: bool,
    /// Size in bytes (0 for directories or non-existent files)
    pub size: u64,
    /// Last modification time (None if not available or file doesn't exist)
    pub modified: Option<DateTime<Utc>>,
    /// Creation time, where the platform records one
    pub created: Option<DateTime<Utc>>,
}

impl FileSystemState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            size: 0,
            modified: None,
            created: None,
        }
    }

    /// Returns true if the file exists and is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }

    /// Returns true if the file exists and is a directory
    pub fn is_directory(&self) -> bool {
        self.exists && !self.is_file
    }
}

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - All paths are absolute.
/// - `get_state` reports a missing path as [`FileSystemState::not_found`],
///   not as an error.
/// - `create_new` must fail if the path already exists, so callers can
///   probe for free temporary names.
pub trait ILocalFileSystem: Send + Sync {
    /// Gets the current state of a file or directory
    fn get_state(&self, path: &Path) -> io::Result<FileSystemState>;

    /// Names of the immediate subdirectories of `path`
    fn list_directories(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Names of the immediate regular files of `path`
    fn list_files(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Opens a file for reading, positioned at `offset`
    fn open_read(&self, path: &Path, offset: u64) -> io::Result<Box<dyn Read + Send>>;

    /// Creates a new file for writing; fails if it already exists
    fn create_new(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;

    /// Creates a directory and all parent directories as needed
    fn create_directory(&self, path: &Path) -> io::Result<()>;

    /// Renames a file or directory
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Permanently deletes a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Permanently deletes a directory and everything below it
    fn remove_directory(&self, path: &Path) -> io::Result<()>;

    /// Moves a file or directory tree to the trash
    fn move_to_trash(&self, path: &Path) -> io::Result<()>;

    /// Applies timestamps to a file
    ///
    /// Platforms that cannot set a creation time ignore `created`.
    fn set_times(
        &self,
        path: &Path,
        modified: DateTime<Utc>,
        created: Option<DateTime<Utc>>,
    ) -> io::Result<()>;

    /// Returns true if `path` is a directory the process is working in
    fn is_in_use(&self, path: &Path) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_state() {
        let state = FileSystemState::not_found();
        assert!(!state.exists);
        assert!(!state.is_regular_file());
        assert!(!state.is_directory());
        assert_eq!(state.size, 0);
        assert!(state.modified.is_none());
    }

    #[test]
    fn test_state_kinds() {
        let file = FileSystemState {
            exists: true,
            is_file: true,
            size: 3,
            modified: None,
            created: None,
        };
        assert!(file.is_regular_file());
        assert!(!file.is_directory());

        let dir = FileSystemState {
            is_file: false,
            ..file
        };
        assert!(dir.is_directory());
    }
}
