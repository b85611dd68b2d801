//! Clean command - Drop ledger entries whose files are gone from both sides

use anyhow::Result;
use clap::Args;

use super::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct CleanCommand {
    /// Partnership name
    pub name: String,
}

impl CleanCommand {
    pub fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut partnership = ctx.open(&self.name)?;

        let removed = partnership.clean_orphaned_checksums();
        if removed > 0 {
            ctx.save(&partnership)?;
        }

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "partnership": self.name,
                "removed": removed,
                "remaining": partnership.ledger().len(),
            }));
        } else if removed == 0 {
            formatter.success("Ledger has no orphaned entries");
        } else {
            formatter.success(&format!("Removed {removed} orphaned ledger entr(y/ies)"));
        }
        Ok(())
    }
}
