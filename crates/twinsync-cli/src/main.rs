//! twinsync CLI - Command-line interface for twinsync
//!
//! Provides commands for:
//! - Registering and removing folder partnerships
//! - Comparing both sides and applying safe resolutions
//! - Resolving a single conflict with an explicit action
//! - Pruning orphaned ledger entries
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    clean::CleanCommand, config::ConfigCommand, partnership::PartnershipCommand,
    resolve::ResolveCommand, sync::SyncCommand, AppContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "twinsync", version, about = "Two-way folder synchronization")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage folder partnerships
    #[command(subcommand)]
    Partnership(PartnershipCommand),
    /// Compare both sides of a partnership
    Sync(SyncCommand),
    /// Resolve one conflict
    Resolve(ResolveCommand),
    /// Remove ledger entries for files gone from both sides
    Clean(CleanCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config.as_deref())?;

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => ctx.config.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Partnership(cmd) => cmd.execute(&ctx, format),
        Commands::Sync(cmd) => cmd.execute(&ctx, format),
        Commands::Resolve(cmd) => cmd.execute(&ctx, format),
        Commands::Clean(cmd) => cmd.execute(&ctx, format),
        Commands::Config(cmd) => cmd.execute(&ctx, format),
    }
}
