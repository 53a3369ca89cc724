//! Admin operations and the freshness report
//!
//! Every admin operation checks the credential before it touches any state.
//! Operations that can promote go through the orchestrator's gate.

#![allow(clippy::result_large_err)]

use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use trailhead_core::errors::{ExError, Result, TrailError};
use trailhead_core_types::Sensitive;
use trailhead_engine::{Orchestrator, RefreshOutcome, Trigger};

/// Health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Freshness {
    pub ok: bool,
    /// `generated_at` of the canonical dataset, `null` if unreadable
    pub updated_at: Option<String>,
}

pub struct ControlSurface {
    orchestrator: Arc<Orchestrator>,
    admin_token: Option<Sensitive<String>>,
}

impl ControlSurface {
    /// With `admin_token = None` every admin call is refused
    pub fn new(orchestrator: Arc<Orchestrator>, admin_token: Option<Sensitive<String>>) -> Self {
        Self {
            orchestrator,
            admin_token,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn authorize(&self, presented: Option<&str>) -> Result<()> {
        match (&self.admin_token, presented) {
            (Some(expected), Some(presented))
                if bool::from(expected.expose().as_bytes().ct_eq(presented.as_bytes())) =>
            {
                Ok(())
            }
            _ => {
                tracing::warn!(component = module_path!(), op = "authorize", "admin call refused");
                Err(ExError::from(TrailError::Unauthorised))
            }
        }
    }

    /// Never fails: an unreadable canonical file reports `updated_at: null`
    pub fn freshness(&self) -> Freshness {
        Freshness {
            ok: true,
            updated_at: self.orchestrator.updated_at(),
        }
    }

    /// Snapshot names, oldest first
    pub fn list_backups(&self, token: Option<&str>) -> Result<Vec<String>> {
        self.authorize(token)?;
        Ok(self
            .orchestrator
            .store()
            .list_snapshots()?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    /// Promote a snapshot by name; returns the promoted name
    pub async fn rollback(&self, token: Option<&str>, name: &str) -> Result<String> {
        self.authorize(token)?;
        let snapshot = self.orchestrator.rollback(name).await?;
        Ok(snapshot.name)
    }

    /// One synchronous run
    pub async fn force_refresh(&self, token: Option<&str>) -> Result<RefreshOutcome> {
        self.authorize(token)?;
        self.orchestrator.refresh(Trigger::Manual).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trailhead_core::errors::ExErrorKind;
    use trailhead_engine::{FileFetcher, NoopEnricher, NoopRenderer, OrchestratorConfig};
    use trailhead_store::{DataLayout, SnapshotStore};

    fn surface(dir: &TempDir, token: Option<&str>) -> ControlSurface {
        let layout = DataLayout::new(dir.path().join("data").join("trails.json"));
        let orchestrator = Orchestrator::new(
            SnapshotStore::new(layout),
            Arc::new(FileFetcher::new(dir.path().join("candidate.json"))),
            Arc::new(NoopEnricher),
            Arc::new(NoopRenderer),
            OrchestratorConfig::default(),
        );
        ControlSurface::new(Arc::new(orchestrator), token.map(|t| Sensitive::new(t.to_string())))
    }

    #[test]
    fn test_exact_token_is_accepted() {
        let dir = TempDir::new().unwrap();
        surface(&dir, Some("let-me-in")).authorize(Some("let-me-in")).unwrap();
    }

    #[test]
    fn test_near_miss_tokens_are_refused() {
        let dir = TempDir::new().unwrap();
        let control = surface(&dir, Some("let-me-in"));
        for presented in ["let-me-io", "let-me-i", "let-me-in!", "", "LET-ME-IN"] {
            let err = control.authorize(Some(presented)).unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::Unauthorised, "accepted {presented:?}");
        }
        assert!(control.authorize(None).is_err());
    }

    #[test]
    fn test_unset_token_refuses_everything() {
        let dir = TempDir::new().unwrap();
        let err = surface(&dir, None).authorize(Some("")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Unauthorised);
    }
}
