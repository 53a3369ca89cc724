//! Trailhead Engine - refresh orchestration
//!
//! Sequences fetch → validate → snapshot → promote → rebuild under a single
//! mutual-exclusion gate, and owns the cold-start bootstrap. The collaborators
//! it drives (Fetcher, Enricher, Renderer) are traits so deployments and tests
//! can plug in their own.

pub mod collaborators;
pub mod fetchers;
pub mod orchestrator;
pub mod outcome;

pub use collaborators::{Enricher, Fetcher, NoopEnricher, NoopRenderer, Renderer};
pub use fetchers::{FileFetcher, HttpJsonFetcher};
pub use orchestrator::{BootstrapReport, Orchestrator, OrchestratorConfig, RunState, Trigger};
pub use outcome::{PromotedRun, RebuildStep, RefreshOutcome, RejectedRun};
