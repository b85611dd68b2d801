//! Breadth-first comparison of two folder trees
//!
//! Each queue pop handles exactly one directory level: its subfolders on
//! both sides, then its files. Subfolders present on both sides are queued;
//! nothing below them is looked at until they are popped.
//!
//! The walk only detects. It never applies a resolution, but it does add
//! ledger entries for files and folders it finds in agreement.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, info};

use twinsync_core::domain::{Conflict, EntityPath, NodeError, Presence, RelativePath, SyncAction, Verdict};
use twinsync_core::ports::{percent, ActionKind};
use twinsync_core::syncable::{FileNode, FolderNode};
use twinsync_core::{SyncContext, SyncableNode};

use crate::file_engine::{FileComparison, FileSyncEngine};
use crate::filter::ExclusionFilter;

/// Everything one tree walk found
#[derive(Debug, Default)]
pub struct SyncReport {
    pub conflicts: Vec<Conflict>,
    pub folders_visited: u64,
    pub files_compared: u64,
    pub entries_recorded: u64,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Walks two folder trees side by side
#[derive(Debug, Clone, Copy)]
pub struct TreeSyncEngine<'f> {
    filter: &'f ExclusionFilter,
    files: FileSyncEngine,
}

impl<'f> TreeSyncEngine<'f> {
    pub fn new(filter: &'f ExclusionFilter) -> Self {
        Self {
            filter,
            files: FileSyncEngine::new(),
        }
    }

    /// Compares the trees below `left` and `right`
    ///
    /// # Errors
    /// Listing failures and [`NodeError::UserCancelled`] end the walk; the
    /// conflicts found so far are dropped.
    pub fn sync(
        &self,
        left: &FolderNode,
        right: &FolderNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<SyncReport, NodeError> {
        let mut report = SyncReport::default();
        let mut queue = VecDeque::from([RelativePath::root()]);

        while let Some(dir) = queue.pop_front() {
            let done = report.folders_visited;
            ctx.set_overall_percent(percent(done, done + queue.len() as u64 + 1));

            let left_dir = FolderNode::new(left.root(), left.relative_path().join_path(&dir));
            let right_dir = FolderNode::new(right.root(), right.relative_path().join_path(&dir));
            ctx.report(&left_dir.entity_path().encode(), ActionKind::Sync, 0)?;

            self.diff_folders(&left_dir, &right_dir, &mut queue, &dir, ctx, &mut report)?;
            self.diff_files(&left_dir, &right_dir, ctx, &mut report)?;

            report.folders_visited += 1;
            ctx.report(&left_dir.entity_path().encode(), ActionKind::Sync, 100)?;
        }

        ctx.set_overall_percent(100);
        info!(
            folders = report.folders_visited,
            files = report.files_compared,
            recorded = report.entries_recorded,
            conflicts = report.conflicts.len(),
            "Tree walk complete"
        );
        Ok(report)
    }

    fn diff_folders(
        &self,
        left_dir: &FolderNode,
        right_dir: &FolderNode,
        queue: &mut VecDeque<RelativePath>,
        dir: &RelativePath,
        ctx: &mut SyncContext<'_>,
        report: &mut SyncReport,
    ) -> Result<(), NodeError> {
        let fs = ctx.fs();
        let left_names: BTreeSet<String> = left_dir.list_directories(fs)?.into_iter().collect();
        let right_names: BTreeSet<String> = right_dir.list_directories(fs)?.into_iter().collect();

        for name in left_names.union(&right_names) {
            let mut left_sub = FolderNode::new(left_dir.root(), left_dir.relative_path().join(name));
            let right_sub = FolderNode::new(right_dir.root(), right_dir.relative_path().join(name));
            let entity = left_sub.entity_path();
            if self.skip(&entity, ctx) {
                continue;
            }

            let presence = Presence::new(left_names.contains(name), right_names.contains(name));
            let known = ctx.ledger().contains(&entity);
            let action = match (presence.left, presence.right) {
                (true, true) => {
                    if !known {
                        let checksum = left_sub.checksum(ctx)?;
                        if ctx.ledger_mut().record_if_absent(&entity, checksum) {
                            report.entries_recorded += 1;
                        }
                    }
                    queue.push_back(dir.join(name));
                    continue;
                }
                (true, false) if known => SyncAction::DeleteLeft,
                (true, false) => SyncAction::CopyToRight,
                (false, true) if known => SyncAction::DeleteRight,
                (false, true) => SyncAction::CopyToLeft,
                (false, false) => continue,
            };

            debug!(entity = %entity, %action, "folder present on one side only");
            report.conflicts.push(Conflict::new(
                SyncableNode::Folder(left_sub),
                SyncableNode::Folder(right_sub),
                presence,
                Verdict::auto(action),
            ));
        }
        Ok(())
    }

    fn diff_files(
        &self,
        left_dir: &FolderNode,
        right_dir: &FolderNode,
        ctx: &mut SyncContext<'_>,
        report: &mut SyncReport,
    ) -> Result<(), NodeError> {
        let fs = ctx.fs();
        let left_names = left_dir.list_files(fs)?;
        let right_names = right_dir.list_files(fs)?;
        let visited: BTreeSet<&str> = left_names.iter().map(String::as_str).collect();

        let right_only = right_names.iter().filter(|n| !visited.contains(n.as_str()));
        for name in left_names.iter().chain(right_only) {
            let mut left_file = FileNode::new(left_dir.root(), left_dir.relative_path().join(name));
            let mut right_file = FileNode::new(right_dir.root(), right_dir.relative_path().join(name));
            if self.filter.is_excluded(left_file.relative_path()) {
                continue;
            }

            report.files_compared += 1;
            match self.files.compare(&mut left_file, &mut right_file, ctx)? {
                FileComparison::Diverged(conflict) => report.conflicts.push(conflict),
                FileComparison::InSync { recorded: true } => report.entries_recorded += 1,
                FileComparison::InSync { recorded: false }
                | FileComparison::Missing
                | FileComparison::Ignored => {}
            }
        }
        Ok(())
    }

    fn skip(&self, entity: &EntityPath, ctx: &SyncContext<'_>) -> bool {
        if self.filter.is_excluded(entity.relative()) {
            return true;
        }
        if ctx.ledger().is_ignored(entity) {
            debug!(entity = %entity, "skipping ignored folder");
            return true;
        }
        false
    }
}
