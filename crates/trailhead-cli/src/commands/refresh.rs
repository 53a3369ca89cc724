//! One synchronous refresh run

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use trailhead_core::errors::{ExError, TrailError};
use trailhead_engine::{FileFetcher, Fetcher, RefreshOutcome, Trigger};
use trailhead_server::ServiceConfig;

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Read the candidate from this file instead of the configured source
    #[arg(long)]
    pub candidate: Option<PathBuf>,
}

pub async fn execute(config: &ServiceConfig, args: RefreshArgs) -> anyhow::Result<()> {
    let fetcher: Arc<dyn Fetcher> = match args.candidate {
        Some(path) => Arc::new(FileFetcher::new(path)),
        None => config.fetcher()?,
    };
    let orchestrator = config.build_orchestrator_with(fetcher);

    let outcome = orchestrator.refresh(Trigger::Manual).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let RefreshOutcome::Rejected(run) = &outcome {
        let rejected = ExError::from(TrailError::ValidationFailed {
            fault_count: run.details.len(),
        });
        return Err(anyhow::Error::new(rejected).context("last known good dataset kept"));
    }
    Ok(())
}
