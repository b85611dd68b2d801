//! Partnership command - Register, list and remove folder partnerships

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use twinsync_sync::Partnership;

use super::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum PartnershipCommand {
    /// Pair two existing folders under a name
    Add {
        /// Partnership name
        name: String,
        /// Left root folder
        left: PathBuf,
        /// Right root folder
        right: PathBuf,
    },
    /// List registered partnerships
    List,
    /// Forget a partnership (folders are left untouched)
    Remove {
        /// Partnership name
        name: String,
    },
}

impl PartnershipCommand {
    pub fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            PartnershipCommand::Add { name, left, right } => {
                self.execute_add(ctx, name, left, right, format)
            }
            PartnershipCommand::List => self.execute_list(ctx, format),
            PartnershipCommand::Remove { name } => self.execute_remove(ctx, name, format),
        }
    }

    fn execute_add(
        &self,
        ctx: &AppContext,
        name: &str,
        left: &Path,
        right: &Path,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = get_formatter(format);

        let left = canonical_root("left", left)?;
        let right = canonical_root("right", right)?;
        if left.starts_with(&right) || right.starts_with(&left) {
            bail!(
                "Roots must not contain each other: {} and {}",
                left.display(),
                right.display()
            );
        }

        let partnership = Partnership::new(name, &left, &right, ctx.filesystem(), ctx.config.sync.clone())?;
        ctx.store().insert(partnership.to_record())?;
        info!(name, left = %left.display(), right = %right.display(), "Partnership added");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "name": name,
                "left": left.display().to_string(),
                "right": right.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Partnership '{name}' added"));
            formatter.info(&format!("Left:  {}", left.display()));
            formatter.info(&format!("Right: {}", right.display()));
        }
        Ok(())
    }

    fn execute_list(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let records = ctx.store().load()?;

        if format.is_json() {
            let items: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "left": r.left.display().to_string(),
                        "right": r.right.display().to_string(),
                        "ledger_entries": r.ledger.len(),
                        "ignored": r.ledger.ignored().count(),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({ "partnerships": items }));
            return Ok(());
        }

        if records.is_empty() {
            formatter.info("No partnerships registered");
            return Ok(());
        }
        formatter.success(&format!("{} partnership(s)", records.len()));
        for record in &records {
            formatter.info(&format!(
                "{}: {} <-> {} ({} ledger entries)",
                record.name,
                record.left.display(),
                record.right.display(),
                record.ledger.len()
            ));
        }
        Ok(())
    }

    fn execute_remove(&self, ctx: &AppContext, name: &str, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let removed = ctx.store().remove(name)?;
        info!(name, "Partnership removed");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "name": removed.name,
            }));
        } else {
            formatter.success(&format!("Partnership '{}' removed", removed.name));
        }
        Ok(())
    }
}

fn canonical_root(side: &str, path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot resolve {side} folder {}", path.display()))?;
    if !root.is_dir() {
        bail!("{side} root is not a directory: {}", root.display());
    }
    Ok(root)
}
