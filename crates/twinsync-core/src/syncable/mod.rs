//! Syncable nodes
//!
//! A [`SyncableNode`] is either a file or a folder located by a partnership
//! root plus a [`RelativePath`]. Both variants offer the same capability set
//! (identity, existence, checksum, copy, delete, merge, child creation),
//! dispatched by `match`.
//!
//! Nodes never own the ledger. Operations that need it, or the filesystem,
//! or the progress observer, receive a [`SyncContext`].
//!
//! Existence is re-queried on every call. The checksum is memoized in an
//! `Option<u64>` that is cleared by [`SyncableNode::invalidate_checksum`]
//! and replaced after a copy.

mod file;
mod folder;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::context::SyncContext;
use crate::domain::{EntityKind, EntityPath, NodeError, RelativePath};
use crate::ports::ILocalFileSystem;

pub use file::{have_equal_checksums, FileNode};
pub use folder::FolderNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncableNode {
    File(FileNode),
    Folder(FolderNode),
}

impl SyncableNode {
    pub fn file(root: impl Into<PathBuf>, relative: RelativePath) -> Self {
        SyncableNode::File(FileNode::new(root, relative))
    }

    pub fn folder(root: impl Into<PathBuf>, relative: RelativePath) -> Self {
        SyncableNode::Folder(FolderNode::new(root, relative))
    }

    /// The root folder of a partnership side
    pub fn root_folder(root: impl Into<PathBuf>) -> Self {
        Self::folder(root, RelativePath::root())
    }

    /// Factory keyed on the entity path's type tag
    pub fn from_entity(root: &Path, entity: &EntityPath) -> Self {
        match entity.kind() {
            EntityKind::File => Self::file(root, entity.relative().clone()),
            EntityKind::Folder => Self::folder(root, entity.relative().clone()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SyncableNode::File(_) => EntityKind::File,
            SyncableNode::Folder(_) => EntityKind::Folder,
        }
    }

    pub fn root(&self) -> &Path {
        match self {
            SyncableNode::File(f) => f.root(),
            SyncableNode::Folder(f) => f.root(),
        }
    }

    pub fn relative_path(&self) -> &RelativePath {
        match self {
            SyncableNode::File(f) => f.relative_path(),
            SyncableNode::Folder(f) => f.relative_path(),
        }
    }

    pub fn full_path(&self) -> PathBuf {
        match self {
            SyncableNode::File(f) => f.full_path(),
            SyncableNode::Folder(f) => f.full_path(),
        }
    }

    pub fn entity_path(&self) -> EntityPath {
        match self {
            SyncableNode::File(f) => f.entity_path(),
            SyncableNode::Folder(f) => f.entity_path(),
        }
    }

    /// Live existence check; the right kind must be present
    pub fn exists(&self, fs: &dyn ILocalFileSystem) -> bool {
        match self {
            SyncableNode::File(f) => f.exists(fs),
            SyncableNode::Folder(f) => f.exists(fs),
        }
    }

    pub fn last_write_time(
        &self,
        fs: &dyn ILocalFileSystem,
    ) -> Result<Option<DateTime<Utc>>, NodeError> {
        let state = match self {
            SyncableNode::File(f) => f.state(fs)?,
            SyncableNode::Folder(f) => f.state(fs)?,
        };
        Ok(state.modified)
    }

    pub fn cached_checksum(&self) -> Option<u64> {
        match self {
            SyncableNode::File(f) => f.cached_checksum(),
            SyncableNode::Folder(f) => f.cached_checksum(),
        }
    }

    /// Drops the memoized checksum so the next call recomputes it
    pub fn invalidate_checksum(&mut self) {
        match self {
            SyncableNode::File(f) => f.invalidate_checksum(),
            SyncableNode::Folder(f) => f.invalidate_checksum(),
        }
    }

    pub fn checksum(&mut self, ctx: &mut SyncContext<'_>) -> Result<u64, NodeError> {
        match self {
            SyncableNode::File(f) => f.checksum(ctx),
            SyncableNode::Folder(f) => f.checksum(ctx),
        }
    }

    /// True if the checksum differs from the ledger, or the ledger has no entry
    pub fn has_changed(&mut self, ctx: &mut SyncContext<'_>) -> Result<bool, NodeError> {
        match self {
            SyncableNode::File(f) => f.has_changed(ctx),
            SyncableNode::Folder(f) => {
                let recorded = ctx.ledger().get(&f.entity_path());
                match recorded {
                    None => Ok(true),
                    Some(recorded) => Ok(f.checksum(ctx)? != recorded),
                }
            }
        }
    }

    /// Copies this node over `dest`; both must be the same variant
    ///
    /// Returns the checksum both nodes share afterwards.
    pub fn copy_to(
        &mut self,
        dest: &mut SyncableNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<u64, NodeError> {
        match (self, dest) {
            (SyncableNode::File(src), SyncableNode::File(dst)) => src.copy_to(dst, ctx),
            (SyncableNode::Folder(src), SyncableNode::Folder(dst)) => src.copy_to(dst, ctx),
            (src, dst) => Err(NodeError::InvalidArgument(format!(
                "cannot copy {} over {}",
                src.entity_path(),
                dst.entity_path()
            ))),
        }
    }

    pub fn delete(&self, recoverable: bool, ctx: &mut SyncContext<'_>) -> Result<(), NodeError> {
        match self {
            SyncableNode::File(f) => f.delete(recoverable, ctx),
            SyncableNode::Folder(f) => f.delete(recoverable, ctx),
        }
    }

    /// Content merge has no implementation and always fails
    pub fn merge(&self, _other: &SyncableNode) -> Result<(), NodeError> {
        Err(NodeError::NotImplemented("merge"))
    }

    /// Builds the node for a descendant entity without touching the disk
    ///
    /// # Errors
    /// Files have no children: [`NodeError::InvalidArgument`].
    pub fn create_child(&self, entity: &EntityPath) -> Result<SyncableNode, NodeError> {
        match self {
            SyncableNode::Folder(f) => Ok(f.create_child(entity)),
            SyncableNode::File(f) => Err(NodeError::InvalidArgument(format!(
                "file {} cannot have child {entity}",
                f.entity_path()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(p: &str) -> RelativePath {
        RelativePath::parse(p).unwrap()
    }

    #[test]
    fn test_entity_paths() {
        let file = SyncableNode::file("/left", rel("docs/a.txt"));
        let folder = SyncableNode::folder("/left", rel("docs"));
        assert_eq!(file.entity_path().encode(), "file:\\docs\\a.txt");
        assert_eq!(folder.entity_path().encode(), "folder:\\docs");
        assert_eq!(file.kind(), EntityKind::File);
        assert_eq!(folder.kind(), EntityKind::Folder);
    }

    #[test]
    fn test_entity_path_independent_of_root() {
        let a = SyncableNode::file("/mnt/usb/left", rel("a.txt"));
        let b = SyncableNode::file("/home/me/right", rel("a.txt"));
        assert_eq!(a.entity_path(), b.entity_path());
        assert_ne!(a.full_path(), b.full_path());
    }

    #[test]
    fn test_full_path() {
        let node = SyncableNode::file("/left", rel("docs/a.txt"));
        assert_eq!(node.full_path(), PathBuf::from("/left/docs/a.txt"));
        assert_eq!(SyncableNode::root_folder("/left").full_path(), PathBuf::from("/left"));
    }

    #[test]
    fn test_create_child_from_folder() {
        let root = SyncableNode::root_folder("/left");

        let file = root
            .create_child(&EntityPath::decode("file:\\docs\\a.txt").unwrap())
            .unwrap();
        assert!(matches!(file, SyncableNode::File(_)));
        assert_eq!(file.full_path(), PathBuf::from("/left/docs/a.txt"));

        let folder = root
            .create_child(&EntityPath::decode("folder:\\docs").unwrap())
            .unwrap();
        assert!(matches!(folder, SyncableNode::Folder(_)));
        assert_eq!(folder.root(), Path::new("/left"));
    }

    #[test]
    fn test_create_child_from_file_fails() {
        let file = SyncableNode::file("/left", rel("a.txt"));
        let result = file.create_child(&EntityPath::decode("file:\\b.txt").unwrap());
        assert!(matches!(result, Err(NodeError::InvalidArgument(_))));
    }

    #[test]
    fn test_merge_not_implemented() {
        let a = SyncableNode::file("/left", rel("a.txt"));
        let b = SyncableNode::file("/right", rel("a.txt"));
        assert!(matches!(a.merge(&b), Err(NodeError::NotImplemented(_))));
    }

    #[test]
    fn test_invalidate_checksum() {
        let mut node = SyncableNode::file("/left", rel("a.txt"));
        if let SyncableNode::File(f) = &mut node {
            f.set_cached_checksum(Some(5));
        }
        assert_eq!(node.cached_checksum(), Some(5));
        node.invalidate_checksum();
        assert_eq!(node.cached_checksum(), None);
    }
}
