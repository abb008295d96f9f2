//! LeadQ CLI - Command-line interface for the booth lead queue
//!
//! Provides commands for:
//! - Capturing a lead (delivered now or queued locally)
//! - Draining the local queue
//! - Inspecting and clearing the queue
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leadq_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    clear::ClearCommand, config::ConfigCommand, status::StatusCommand, submit::SubmitCommand,
    sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "leadq", version, about = "Offline-first booth lead capture")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Capture a lead: send it now or keep it for later
    Submit(SubmitCommand),
    /// Send every queued lead that is still pending
    Sync(SyncCommand),
    /// Show the local queue
    Status(StatusCommand),
    /// Delete every queued lead, failed ones included
    Clear(ClearCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Submit(cmd) => cmd.execute(format, &config_path).await,
        Commands::Sync(cmd) => cmd.execute(format, &config_path).await,
        Commands::Status(cmd) => cmd.execute(format, &config_path).await,
        Commands::Clear(cmd) => cmd.execute(format, &config_path).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
    }
}
