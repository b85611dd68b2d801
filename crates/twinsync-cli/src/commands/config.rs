//! Config command - View and validate twinsync configuration
//!
//! Provides the `twinsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration and reports errors

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use super::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx, format),
            ConfigCommand::Validate => self.execute_validate(ctx, format),
        }
    }

    fn execute_show(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if format.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");
            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let errors = ctx.config.validate();

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": ctx.config_path.display().to_string(),
                "errors": errors
                    .iter()
                    .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                    .collect::<Vec<_>>(),
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
        } else {
            formatter.error(&format!("{} configuration error(s)", errors.len()));
            for error in &errors {
                formatter.info(&error.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("configuration is invalid")
        }
    }
}
