//! Folder variant of a syncable node
//!
//! The folder checksum is shallow: it covers the sorted names of the
//! immediate children only. Two folders with the same child listing compare
//! equal whatever the children contain.
//!
//! Copying a folder mirrors it: the destination subtree is deleted first,
//! then every directory and file of the source is recreated. Content that
//! only existed at the destination is lost.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::context::SyncContext;
use crate::domain::{EntityPath, NodeError, RelativePath, RollingChecksum};
use crate::ports::{percent, ActionKind, FileSystemState, ILocalFileSystem};

use super::file::FileNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    root: PathBuf,
    relative: RelativePath,
    checksum: Option<u64>,
}

impl FolderNode {
    pub fn new(root: impl Into<PathBuf>, relative: RelativePath) -> Self {
        Self {
            root: root.into(),
            relative,
            checksum: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative
    }

    pub fn full_path(&self) -> PathBuf {
        self.relative.to_path(&self.root)
    }

    pub fn entity_path(&self) -> EntityPath {
        EntityPath::folder(self.relative.clone())
    }

    pub fn cached_checksum(&self) -> Option<u64> {
        self.checksum
    }

    pub(crate) fn set_cached_checksum(&mut self, checksum: Option<u64>) {
        self.checksum = checksum;
    }

    /// Drops the memoized checksum so the next call recomputes it
    pub fn invalidate_checksum(&mut self) {
        self.checksum = None;
    }

    pub fn state(&self, fs: &dyn ILocalFileSystem) -> Result<FileSystemState, NodeError> {
        let path = self.full_path();
        fs.get_state(&path).map_err(|e| NodeError::from_io(e, &path))
    }

    pub fn exists(&self, fs: &dyn ILocalFileSystem) -> bool {
        match self.state(fs) {
            Ok(state) => state.is_directory(),
            Err(e) => {
                debug!(path = %self.full_path().display(), error = %e, "stat failed, treating as missing");
                false
            }
        }
    }

    /// Immediate subdirectory names, sorted
    pub fn list_directories(&self, fs: &dyn ILocalFileSystem) -> Result<Vec<String>, NodeError> {
        let path = self.full_path();
        let mut names = fs
            .list_directories(&path)
            .map_err(|e| NodeError::from_io(e, &path))?;
        names.sort();
        Ok(names)
    }

    /// Immediate file names, sorted
    pub fn list_files(&self, fs: &dyn ILocalFileSystem) -> Result<Vec<String>, NodeError> {
        let path = self.full_path();
        let mut names = fs
            .list_files(&path)
            .map_err(|e| NodeError::from_io(e, &path))?;
        names.sort();
        Ok(names)
    }

    /// Shallow checksum over the sorted immediate child names
    pub fn checksum(&mut self, ctx: &mut SyncContext<'_>) -> Result<u64, NodeError> {
        if let Some(checksum) = self.checksum {
            return Ok(checksum);
        }

        let fs = ctx.fs();
        let path = self.full_path();
        let mut names = fs
            .list_directories(&path)
            .map_err(|e| NodeError::from_read(e, &path))?;
        names.extend(
            fs.list_files(&path)
                .map_err(|e| NodeError::from_read(e, &path))?,
        );
        names.sort();

        let mut sum = RollingChecksum::new();
        for name in &names {
            sum.update(name.as_bytes());
            sum.update(&[0]);
        }
        ctx.report(&self.entity_path().encode(), ActionKind::Checksum, 100)?;

        self.checksum = Some(sum.value());
        Ok(sum.value())
    }

    /// Replaces `dest` with a full copy of this folder
    ///
    /// Returns the shallow checksum both folders share afterwards.
    pub fn copy_to(
        &mut self,
        dest: &mut FolderNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<u64, NodeError> {
        let fs = ctx.fs();
        let source = self.full_path();
        let target = dest.full_path();

        if !self.state(fs)?.is_directory() {
            return Err(NodeError::DirectoryDoesNotExist(source));
        }

        let dest_state = dest.state(fs)?;
        if dest_state.exists && !dest_state.is_directory() {
            return Err(NodeError::InvalidArgument(format!(
                "cannot copy folder {} over non-folder {}",
                self.entity_path(),
                target.display()
            )));
        }
        if dest_state.exists {
            info!(target = %target.display(), "removing destination before mirroring folder");
            fs.remove_directory(&target)
                .map_err(|e| NodeError::from_io(e, &target))?;
        }
        fs.create_directory(&target)
            .map_err(|e| NodeError::from_io(e, &target))?;

        let label = self.entity_path().encode();
        let mut queue = VecDeque::from([RelativePath::root()]);
        let mut visited: u64 = 0;
        while let Some(sub) = queue.pop_front() {
            let source_dir = FolderNode::new(self.root.clone(), self.relative.join_path(&sub));

            for name in source_dir.list_directories(fs)? {
                let created = sub.join(&name).to_path(&target);
                fs.create_directory(&created)
                    .map_err(|e| NodeError::from_io(e, &created))?;
                queue.push_back(sub.join(&name));
            }

            for name in source_dir.list_files(fs)? {
                let inner = sub.join(&name);
                let mut from = FileNode::new(self.root.clone(), self.relative.join_path(&inner));
                let mut to = FileNode::new(dest.root.clone(), dest.relative.join_path(&inner));
                from.copy_to(&mut to, ctx)?;
            }

            visited += 1;
            let pending = visited + queue.len() as u64;
            ctx.report(&label, ActionKind::Copy, percent(visited, pending))?;
        }

        self.checksum = None;
        dest.checksum = None;
        let checksum = self.checksum(ctx)?;
        dest.checksum = Some(checksum);
        debug!(source = %source.display(), target = %target.display(), dirs = visited, "folder mirrored");
        Ok(checksum)
    }

    /// Deletes the folder tree, through the trash when `recoverable`
    pub fn delete(&self, recoverable: bool, ctx: &mut SyncContext<'_>) -> Result<(), NodeError> {
        let path = self.full_path();
        let fs = ctx.fs();
        if !self.state(fs)?.is_directory() {
            return Err(NodeError::DirectoryDoesNotExist(path));
        }
        if fs.is_in_use(&path) {
            return Err(NodeError::IsWorkingFolder(path));
        }

        ctx.report(&self.entity_path().encode(), ActionKind::Delete, 0)?;
        let result = if recoverable {
            fs.move_to_trash(&path)
        } else {
            fs.remove_directory(&path)
        };
        result.map_err(|e| NodeError::from_io(e, &path))
    }

    /// Builds the node for a descendant entity without touching the disk
    pub fn create_child(&self, entity: &EntityPath) -> super::SyncableNode {
        super::SyncableNode::from_entity(&self.root, entity)
    }
}
