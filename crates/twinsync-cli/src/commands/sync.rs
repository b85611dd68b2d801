//! Sync command - Compare both sides of a partnership
//!
//! Without flags the walk records agreeing entries and lists conflicts.
//! `--auto` additionally applies every auto-resolvable conflict;
//! `--dry-run` leaves the stored ledger untouched.

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use twinsync_conflict::BatchResult;

use super::{conflict_json, describe_conflict, log_progress, AppContext};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Partnership name
    pub name: String,

    /// Apply every conflict that is safe to resolve automatically
    #[arg(long)]
    pub auto: bool,

    /// Report without saving the ledger or applying anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        if self.auto && self.dry_run {
            bail!("--auto and --dry-run cannot be combined");
        }
        let formatter = get_formatter(format);
        let mut partnership = ctx.open(&self.name)?;
        let mut observer = log_progress;

        let report = partnership.sync(&mut observer)?;
        let (folders, files, recorded) = (
            report.folders_visited,
            report.files_compared,
            report.entries_recorded,
        );

        let (batch, pending) = if self.auto {
            partnership.resolve_auto(report.conflicts, &mut observer)?
        } else {
            (BatchResult::default(), report.conflicts)
        };

        if !self.dry_run {
            ctx.save(&partnership)?;
        }
        info!(
            partnership = %self.name,
            resolved = batch.resolved_count(),
            pending = pending.len(),
            "Sync command finished"
        );

        if format.is_json() {
            let resolved: Vec<serde_json::Value> = batch
                .resolved
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "entity": r.left().entity_path().encode(),
                        "action": r.action_done().as_str(),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({
                "partnership": self.name,
                "dry_run": self.dry_run,
                "folders_visited": folders,
                "files_compared": files,
                "entries_recorded": recorded,
                "resolved": resolved,
                "failed": batch.failed,
                "errors": batch.errors,
                "conflicts": pending.iter().map(conflict_json).collect::<Vec<_>>(),
            }));
            return Ok(());
        }

        formatter.success(&format!(
            "Compared '{}': {folders} folder(s), {files} file(s)",
            self.name
        ));
        if self.dry_run {
            formatter.info("Dry run, ledger not saved");
        } else if recorded > 0 {
            formatter.info(&format!("{recorded} ledger entr(y/ies) recorded"));
        }
        for resolved in &batch.resolved {
            formatter.info(&format!(
                "{} {}",
                resolved.action_done(),
                resolved.left().entity_path()
            ));
        }
        for error in &batch.errors {
            formatter.warn(error);
        }
        if pending.is_empty() {
            formatter.info("No conflicts");
        } else {
            formatter.info(&format!("{} conflict(s):", pending.len()));
            for conflict in &pending {
                formatter.info(&format!("  {}", describe_conflict(conflict)));
            }
        }
        Ok(())
    }
}
