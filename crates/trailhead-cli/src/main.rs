//! Trailhead CLI
//!
//! Runs the service or drives single pipeline operations against a data file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trailhead_core::logging_facility;
use trailhead_server::ServiceConfig;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "trailhead")]
#[command(about = "Trail status dataset - refresh, promotion and rollback", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./trailhead.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Canonical dataset file, overriding configuration
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bootstrap, schedule the daily refresh and serve the HTTP API
    Serve,
    /// Run one refresh and print the outcome
    Refresh(commands::refresh::RefreshArgs),
    /// List history snapshots, oldest first
    Backups,
    /// Promote a history snapshot to canonical
    Rollback(commands::admin::RollbackArgs),
    /// Print the freshness of the canonical dataset
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }
    logging_facility::init(config.log_profile);

    match cli.command {
        Commands::Serve => trailhead_server::serve(config).await?,
        Commands::Refresh(args) => commands::refresh::execute(&config, args).await?,
        Commands::Backups => commands::admin::backups(&config)?,
        Commands::Rollback(args) => commands::admin::rollback(&config, args).await?,
        Commands::Health => commands::admin::health(&config)?,
    }
    Ok(())
}
