//! Operator commands over the local data layout

use clap::Args;
use trailhead_core::errors::ExErrorKind;
use trailhead_server::{Freshness, ServiceConfig};
use trailhead_store::freshness;

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// Snapshot file name, as printed by `trailhead backups`
    pub name: String,
}

pub fn backups(config: &ServiceConfig) -> anyhow::Result<()> {
    for snapshot in config.snapshot_store().list_snapshots()? {
        println!("{}", snapshot.name);
    }
    Ok(())
}

pub async fn rollback(config: &ServiceConfig, args: RollbackArgs) -> anyhow::Result<()> {
    let orchestrator = config.build_orchestrator()?;
    match orchestrator.rollback(&args.name).await {
        Ok(snapshot) => {
            println!("promoted {}", snapshot.name);
            Ok(())
        }
        Err(e) if e.kind() == ExErrorKind::NotFound => {
            anyhow::bail!("no snapshot named {}", args.name)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn health(config: &ServiceConfig) -> anyhow::Result<()> {
    let store = config.snapshot_store();
    let freshness = Freshness {
        ok: true,
        updated_at: freshness::updated_at(store.layout()),
    };
    println!("{}", serde_json::to_string(&freshness)?);
    Ok(())
}
