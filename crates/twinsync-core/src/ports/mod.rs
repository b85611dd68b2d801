//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalFileSystem`] - Filesystem queries, streams and copy/move/delete
//! - [`ProgressObserver`] - Progress reporting and cooperative cancellation

pub mod local_filesystem;
pub mod progress;

pub use local_filesystem::{FileSystemState, ILocalFileSystem};
pub use progress::{percent, ActionKind, NoProgress, ProgressObserver, SyncStatus};
