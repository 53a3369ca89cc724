//! Result of one orchestrator run

use serde::Serialize;
use serde_json::Value;
use trailhead_core::ValidationFault;
use trailhead_store::PruneReport;

/// One Enricher/Renderer invocation after a promotion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildStep {
    pub step: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RebuildStep {
    pub fn succeeded(step: &str, detail: Value) -> Self {
        Self {
            step: step.to_string(),
            ok: true,
            detail: Some(detail),
            error: None,
        }
    }

    pub fn failed(step: &str, error: impl ToString) -> Self {
        Self {
            step: step.to_string(),
            ok: false,
            detail: None,
            error: Some(error.to_string()),
        }
    }
}

/// The candidate became a snapshot and was promoted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotedRun {
    pub ok: bool,
    pub run_id: String,
    pub count: usize,
    pub snapshot: String,
    pub pruned: PruneReport,
    pub rebuild: Vec<RebuildStep>,
}

/// The candidate failed the Validation Gate; nothing was written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRun {
    pub ok: bool,
    pub run_id: String,
    pub error: String,
    pub details: Vec<ValidationFault>,
}

/// Outcome of a run that got past fetching
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RefreshOutcome {
    Promoted(PromotedRun),
    Rejected(RejectedRun),
}

impl RefreshOutcome {
    pub(crate) fn promoted(
        run_id: String,
        count: usize,
        snapshot: String,
        pruned: PruneReport,
        rebuild: Vec<RebuildStep>,
    ) -> Self {
        RefreshOutcome::Promoted(PromotedRun {
            ok: true,
            run_id,
            count,
            snapshot,
            pruned,
            rebuild,
        })
    }

    pub(crate) fn rejected(run_id: String, details: Vec<ValidationFault>) -> Self {
        RefreshOutcome::Rejected(RejectedRun {
            ok: false,
            run_id,
            error: "validation_failed".to_string(),
            details,
        })
    }

    /// True when the data was promoted, whether or not the rebuild succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, RefreshOutcome::Promoted(_))
    }

    /// Name of the promoted snapshot
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            RefreshOutcome::Promoted(run) => Some(&run.snapshot),
            RefreshOutcome::Rejected(_) => None,
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            RefreshOutcome::Promoted(run) => &run.run_id,
            RefreshOutcome::Rejected(run) => &run.run_id,
        }
    }

    /// Whether any rebuild step failed after a promotion
    pub fn rebuild_failed(&self) -> bool {
        match self {
            RefreshOutcome::Promoted(run) => run.rebuild.iter().any(|s| !s.ok),
            RefreshOutcome::Rejected(_) => false,
        }
    }
}
