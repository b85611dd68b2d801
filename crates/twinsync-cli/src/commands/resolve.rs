//! Resolve command - Settle one conflict
//!
//! The partnership is compared first so the conflict reflects the current
//! state of both sides; the entity must still be diverged. Without
//! `--action` the automatic action is used, then the suggested one; a
//! conflict with neither is refused rather than settled by guesswork.

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use twinsync_core::domain::{Conflict, EntityPath, SyncAction};

use super::{conflict_json, log_progress, AppContext};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Partnership name
    pub name: String,

    /// Entity to resolve, e.g. 'file:\docs\a.txt' or 'folder:/photos'
    pub entity: EntityPath,

    /// Action to take; defaults to the automatic or suggested one
    #[arg(long)]
    pub action: Option<SyncAction>,
}

impl ResolveCommand {
    pub fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut partnership = ctx.open(&self.name)?;
        let mut observer = log_progress;

        let report = partnership.sync(&mut observer)?;
        ctx.save(&partnership)?;
        let Some(mut conflict) = report
            .conflicts
            .into_iter()
            .find(|c| c.entity_path() == self.entity)
        else {
            bail!("No conflict for {} in partnership '{}'", self.entity, self.name);
        };

        let Some(action) = choose_action(&mut conflict, self.action)? else {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "error": "no automatic or suggested action, pass --action",
                    "conflict": conflict_json(&conflict),
                }));
            }
            bail!(
                "{} needs a decision; pass --action ({})",
                self.entity,
                conflict
                    .legal_actions()
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };

        let resolved = partnership.resolve(&conflict, action, &mut observer)?;
        ctx.save(&partnership)?;
        info!(entity = %self.entity, %action, "Conflict resolved");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "entity": self.entity.encode(),
                "action": resolved.action_done().as_str(),
                "resolved_at": resolved.resolved_at().to_rfc3339(),
            }));
        } else {
            formatter.success(&format!("{} {}", resolved.action_done(), self.entity));
        }
        Ok(())
    }
}

/// Picks the action to apply: explicit, then automatic, then suggested
///
/// Returns `None` when the user has to decide.
fn choose_action(conflict: &mut Conflict, explicit: Option<SyncAction>) -> Result<Option<SyncAction>> {
    if let Some(action) = explicit {
        conflict
            .select(action)
            .with_context(|| format!("Cannot resolve {} with {action}", conflict.entity_path()))?;
        return Ok(Some(action));
    }
    if conflict.is_auto_resolvable() {
        return Ok(Some(conflict.auto_resolve_action()));
    }
    Ok(conflict.suggested_action())
}
