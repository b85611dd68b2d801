//! CLI subcommands and the state they share

pub mod clean;
pub mod config;
pub mod partnership;
pub mod resolve;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::trace;

use twinsync_core::config::Config;
use twinsync_core::domain::Conflict;
use twinsync_core::ports::{ILocalFileSystem, SyncStatus};
use twinsync_sync::{LocalFileSystemAdapter, Partnership, PartnershipStore};

/// Loaded configuration plus where it came from
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
}

impl AppContext {
    /// Loads `explicit` strictly, or the default path leniently
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                Ok(Self {
                    config,
                    config_path: path.to_path_buf(),
                })
            }
            None => {
                let config_path = Config::default_path();
                Ok(Self {
                    config: Config::load_or_default(&config_path),
                    config_path,
                })
            }
        }
    }

    pub fn store(&self) -> PartnershipStore {
        PartnershipStore::new(&self.config.store.path)
    }

    pub fn filesystem(&self) -> Arc<dyn ILocalFileSystem> {
        match &self.config.sync.trash_dir {
            Some(dir) => Arc::new(LocalFileSystemAdapter::with_trash_dir(dir)),
            None => Arc::new(LocalFileSystemAdapter::new()),
        }
    }

    /// Restores the named partnership from the store
    pub fn open(&self, name: &str) -> Result<Partnership> {
        let record = self.store().get(name)?;
        let partnership = Partnership::from_record(record, self.filesystem(), self.config.sync.clone())
            .with_context(|| format!("Failed to open partnership '{name}'"))?;
        Ok(partnership)
    }

    /// Writes the partnership's ledger back to the store
    pub fn save(&self, partnership: &Partnership) -> Result<()> {
        self.store()
            .upsert(partnership.to_record())
            .with_context(|| format!("Failed to save partnership '{}'", partnership.name()))
    }
}

/// Progress observer for the CLI; logs and never cancels
pub fn log_progress(status: &SyncStatus<'_>) -> bool {
    trace!(
        object = status.object,
        action = %status.action,
        subtask = status.subtask_percent,
        overall = status.overall_percent,
        "progress"
    );
    true
}

pub fn conflict_json(conflict: &Conflict) -> serde_json::Value {
    serde_json::json!({
        "id": conflict.id().to_string(),
        "entity": conflict.entity_path().encode(),
        "left": conflict.left().full_path().display().to_string(),
        "right": conflict.right().full_path().display().to_string(),
        "auto_resolve": conflict.auto_resolve_action().as_str(),
        "suggested": conflict.suggested_action().map(|a| a.as_str()),
        "legal_actions": conflict
            .legal_actions()
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>(),
        "detected_at": conflict.detected_at().to_rfc3339(),
    })
}

/// One-line human summary of a conflict
pub fn describe_conflict(conflict: &Conflict) -> String {
    let hint = if conflict.is_auto_resolvable() {
        format!("auto: {}", conflict.auto_resolve_action())
    } else if let Some(suggested) = conflict.suggested_action() {
        format!("suggested: {suggested}")
    } else {
        "needs a decision".to_string()
    };
    format!("{} ({hint})", conflict.entity_path())
}
