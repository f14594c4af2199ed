//! docket CLI - Jira and Confluence automation.
//!
//! Provides commands for:
//! - `confluence content|objects`: Extract sections, macros and page structure
//! - `confluence label|team-sync`: Update tickets referenced from pages
//! - `jira list|transition|update`: List and edit tickets
//! - `jira field-id|fields`: Inspect field ids and values

mod commands;
mod error;
mod input;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docket_config::Config;
use tracing_subscriber::EnvFilter;

use commands::{ConfluenceCommand, JiraCommand};
use error::CliError;
use output::Output;

/// docket - Jira and Confluence automation.
#[derive(Parser)]
#[command(name = "docket", version, about)]
struct Cli {
    /// Path to configuration file (default: `DOCKET_CONFIG` or auto-discover docket.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (log every remote call).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Confluence page commands.
    #[command(subcommand)]
    Confluence(ConfluenceCommand),
    /// Jira ticket commands.
    #[command(subcommand)]
    Jira(JiraCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli, output: &Output) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Confluence(cmd) => cmd.execute(&config, output),
        Commands::Jira(cmd) => cmd.execute(&config, output),
    }
}
