//! Contracts of the external collaborators

use async_trait::async_trait;
use serde_json::{json, Value};
use trailhead_core::{Result, TrailDataset};
use trailhead_store::DataLayout;

/// Produces a candidate payload from the upstream source
///
/// The candidate is untyped: only the Validation Gate decides whether it is a
/// dataset. Failures should be `Acquisition` errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Human-readable name of the upstream, used in errors and logs
    fn source_name(&self) -> &str;

    async fn fetch(&self) -> Result<Value>;
}

/// Refreshes supplementary per-trail metadata after a promotion
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Returns a short JSON summary for the run outcome
    async fn enrich(&self, layout: &DataLayout, dataset: &TrailDataset) -> Result<Value>;
}

/// Rebuilds browsable artifacts from the canonical dataset
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns a short JSON summary for the run outcome
    async fn render(&self, layout: &DataLayout, dataset: &TrailDataset) -> Result<Value>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(&self, _layout: &DataLayout, dataset: &TrailDataset) -> Result<Value> {
        Ok(json!({ "skipped": true, "count": dataset.record_count() }))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn render(&self, _layout: &DataLayout, dataset: &TrailDataset) -> Result<Value> {
        Ok(json!({ "skipped": true, "islands": dataset.island_groups.len() }))
    }
}
