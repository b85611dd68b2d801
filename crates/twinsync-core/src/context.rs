//! Explicit context threaded through every sync and resolve call
//!
//! Bundles the filesystem port, the partnership's ledger, the sync settings
//! and the progress observer. Nothing in the core reaches for process-wide
//! state; whatever an operation needs arrives through this value.

use crate::config::SyncConfig;
use crate::domain::{ChecksumLedger, NodeError};
use crate::ports::{ActionKind, ILocalFileSystem, ProgressObserver, SyncStatus};

pub struct SyncContext<'a> {
    fs: &'a dyn ILocalFileSystem,
    ledger: &'a mut ChecksumLedger,
    config: &'a SyncConfig,
    observer: &'a mut dyn ProgressObserver,
    overall_percent: u8,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        fs: &'a dyn ILocalFileSystem,
        ledger: &'a mut ChecksumLedger,
        config: &'a SyncConfig,
        observer: &'a mut dyn ProgressObserver,
    ) -> Self {
        Self {
            fs,
            ledger,
            config,
            observer,
            overall_percent: 0,
        }
    }

    pub fn fs(&self) -> &'a dyn ILocalFileSystem {
        self.fs
    }

    pub fn config(&self) -> &'a SyncConfig {
        self.config
    }

    pub fn ledger(&self) -> &ChecksumLedger {
        &*self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ChecksumLedger {
        &mut *self.ledger
    }

    /// Chunk size for streaming reads and copies
    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size.max(1)
    }

    pub fn overall_percent(&self) -> u8 {
        self.overall_percent
    }

    /// Sets the overall progress attached to every following report
    pub fn set_overall_percent(&mut self, percent: u8) {
        self.overall_percent = percent.min(100);
    }

    /// Reports progress; turns a `false` answer into [`NodeError::UserCancelled`]
    pub fn report(
        &mut self,
        object: &str,
        action: ActionKind,
        subtask_percent: u8,
    ) -> Result<(), NodeError> {
        let status = SyncStatus {
            object,
            action,
            subtask_percent,
            overall_percent: self.overall_percent,
        };
        if self.observer.on_progress(&status) {
            Ok(())
        } else {
            tracing::info!(object, %action, "Operation cancelled by progress observer");
            Err(NodeError::UserCancelled)
        }
    }
}

impl std::fmt::Debug for SyncContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("ledger_entries", &self.ledger.len())
            .field("config", &self.config)
            .field("overall_percent", &self.overall_percent)
            .finish()
    }
}
