//! Partnership orchestrator
//!
//! A partnership pairs two root folders with the ledger of the checksums
//! they last agreed on. It is the entry point for callers: sync, resolve
//! and ledger maintenance all go through it, each call building a fresh
//! [`SyncContext`] from the partnership's own state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use twinsync_conflict::{BatchResult, ConflictResolver};
use twinsync_core::config::SyncConfig;
use twinsync_core::domain::{ChecksumLedger, Conflict, EntityPath, RelativePath, Resolved, SyncAction};
use twinsync_core::ports::{ILocalFileSystem, ProgressObserver};
use twinsync_core::syncable::FolderNode;
use twinsync_core::{SyncContext, SyncableNode};

use crate::filter::ExclusionFilter;
use crate::tree_engine::{SyncReport, TreeSyncEngine};
use crate::SyncError;

/// Serialized form of a partnership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnershipRecord {
    pub name: String,
    pub left: PathBuf,
    pub right: PathBuf,
    #[serde(default)]
    pub ledger: ChecksumLedger,
}

/// Two synchronized folder trees and their shared ledger
pub struct Partnership {
    name: String,
    left: FolderNode,
    right: FolderNode,
    ledger: ChecksumLedger,
    fs: Arc<dyn ILocalFileSystem>,
    config: SyncConfig,
    filter: ExclusionFilter,
}

impl std::fmt::Debug for Partnership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partnership")
            .field("name", &self.name)
            .field("left", &self.left.full_path())
            .field("right", &self.right.full_path())
            .field("ledger_entries", &self.ledger.len())
            .finish()
    }
}

impl Partnership {
    /// Creates a partnership with an empty ledger
    ///
    /// # Errors
    /// Fails if an exclusion pattern in `config` does not compile.
    pub fn new(
        name: impl Into<String>,
        left: impl Into<PathBuf>,
        right: impl Into<PathBuf>,
        fs: Arc<dyn ILocalFileSystem>,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        Self::with_ledger(name, left, right, ChecksumLedger::new(), fs, config)
    }

    fn with_ledger(
        name: impl Into<String>,
        left: impl Into<PathBuf>,
        right: impl Into<PathBuf>,
        ledger: ChecksumLedger,
        fs: Arc<dyn ILocalFileSystem>,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let filter = ExclusionFilter::new(&config.exclude)?;
        Ok(Self {
            name: name.into(),
            left: FolderNode::new(left, RelativePath::root()),
            right: FolderNode::new(right, RelativePath::root()),
            ledger,
            fs,
            config,
            filter,
        })
    }

    /// Restores a partnership from its serialized form
    pub fn from_record(
        record: PartnershipRecord,
        fs: Arc<dyn ILocalFileSystem>,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        Self::with_ledger(record.name, record.left, record.right, record.ledger, fs, config)
    }

    pub fn to_record(&self) -> PartnershipRecord {
        PartnershipRecord {
            name: self.name.clone(),
            left: self.left.root().to_path_buf(),
            right: self.right.root().to_path_buf(),
            ledger: self.ledger.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn left_root(&self) -> &Path {
        self.left.root()
    }

    pub fn right_root(&self) -> &Path {
        self.right.root()
    }

    pub fn ledger(&self) -> &ChecksumLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ChecksumLedger {
        &mut self.ledger
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Node pair for an entity under both roots
    pub fn nodes(&self, entity: &EntityPath) -> (SyncableNode, SyncableNode) {
        twinsync_conflict::nodes_for(self.left.root(), self.right.root(), entity)
    }

    /// Compares both trees and returns every divergence found
    ///
    /// In-sync entities missing from the ledger are recorded; nothing is
    /// copied or deleted. The walk works on a copy of the ledger that
    /// replaces the stored one only when the walk completes, so a cancelled
    /// or failed sync leaves the ledger as it was.
    pub fn sync(&mut self, observer: &mut dyn ProgressObserver) -> Result<SyncReport, SyncError> {
        self.check_roots()?;
        self.left.invalidate_checksum();
        self.right.invalidate_checksum();

        info!(partnership = %self.name, "Starting sync");
        let mut working = self.ledger.clone();
        let mut ctx = SyncContext::new(&*self.fs, &mut working, &self.config, observer);
        let report = TreeSyncEngine::new(&self.filter).sync(&self.left, &self.right, &mut ctx)?;
        self.ledger = working;

        info!(
            partnership = %self.name,
            conflicts = report.conflicts.len(),
            recorded = report.entries_recorded,
            "Sync finished"
        );
        Ok(report)
    }

    /// Carries out `action` on `conflict`
    pub fn resolve(
        &mut self,
        conflict: &Conflict,
        action: SyncAction,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Resolved, SyncError> {
        let mut ctx = SyncContext::new(&*self.fs, &mut self.ledger, &self.config, observer);
        Ok(ConflictResolver::new().resolve(&mut ctx, conflict, action)?)
    }

    /// Carries out each conflict's chosen action
    pub fn resolve_batch(
        &mut self,
        conflicts: &[Conflict],
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchResult, SyncError> {
        let mut ctx = SyncContext::new(&*self.fs, &mut self.ledger, &self.config, observer);
        Ok(ConflictResolver::new().resolve_batch(&mut ctx, conflicts)?)
    }

    /// Applies every auto-resolvable conflict, returning the ones left over
    pub fn resolve_auto(
        &mut self,
        conflicts: Vec<Conflict>,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(BatchResult, Vec<Conflict>), SyncError> {
        let mut ctx = SyncContext::new(&*self.fs, &mut self.ledger, &self.config, observer);
        Ok(twinsync_conflict::resolve_auto(&mut ctx, conflicts)?)
    }

    /// Drops ledger entries whose entity exists on neither side
    ///
    /// Ignore markers are cleaned the same way. Returns how many keys were
    /// removed.
    pub fn clean_orphaned_checksums(&mut self) -> usize {
        let fs = &*self.fs;
        let root = SyncableNode::Folder(self.left.clone());
        let other = SyncableNode::Folder(self.right.clone());
        let is_orphan = |entity: &EntityPath| -> bool {
            match (root.create_child(entity), other.create_child(entity)) {
                (Ok(left), Ok(right)) => !left.exists(fs) && !right.exists(fs),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(entity = %entity, error = %e, "cannot build nodes for ledger key");
                    false
                }
            }
        };

        let orphans: Vec<EntityPath> = self.ledger.paths().filter(|p| is_orphan(*p)).cloned().collect();
        let ignored: Vec<EntityPath> = self.ledger.ignored().filter(|p| is_orphan(*p)).cloned().collect();

        for entity in &orphans {
            self.ledger.remove(entity);
            debug!(entity = %entity, "orphaned checksum removed");
        }
        for entity in &ignored {
            self.ledger.unignore(entity);
            debug!(entity = %entity, "orphaned ignore marker removed");
        }

        let removed = orphans.len() + ignored.len();
        info!(partnership = %self.name, removed, "Orphaned checksums cleaned");
        removed
    }

    fn check_roots(&self) -> Result<(), SyncError> {
        for (side, root) in [("left", &self.left), ("right", &self.right)] {
            let state = root.state(&*self.fs)?;
            if !state.is_directory() {
                return Err(SyncError::RootMissing {
                    side,
                    path: root.full_path(),
                });
            }
        }
        Ok(())
    }
}
