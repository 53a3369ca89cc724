//! Shared fixtures for orchestrator tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use trailhead_core::{ExError, ExErrorKind, Result, TrailDataset, TrailError};
use trailhead_engine::{
    Enricher, Fetcher, NoopEnricher, NoopRenderer, Orchestrator, OrchestratorConfig, Renderer,
};
use trailhead_store::{DataLayout, SnapshotStore};

/// A valid payload with `trails` records on Madeira
pub fn payload(stamp: &str, trails: usize) -> Value {
    let trails: Vec<Value> = (0..trails)
        .map(|i| {
            json!({"code": format!("PR{}", i + 1), "name": format!("Trail {}", i + 1), "status": "open"})
        })
        .collect();
    json!({
        "generated_at": stamp,
        "island_groups": [{"island": "Madeira", "trails": trails}],
        "status_legend": {"open": "Fully open", "closed": "Closed"},
        "sources": [{"kind": "pdf", "url": "https://example.org/status.pdf", "fetched_at": stamp}]
    })
}

/// A payload the bundled schema rejects
pub fn invalid_payload(stamp: &str) -> Value {
    let mut p = payload(stamp, 1);
    p.as_object_mut().unwrap().remove("status_legend");
    p
}

/// Hands out queued payloads in order
pub struct StaticFetcher {
    queue: Mutex<VecDeque<Value>>,
}

impl StaticFetcher {
    pub fn new(payloads: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(payloads.into()),
        })
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    fn source_name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Value> {
        self.queue.lock().unwrap().pop_front().ok_or_else(|| {
            TrailError::FetchFailed {
                source_name: "static".into(),
                reason: "queue exhausted".into(),
            }
            .into()
        })
    }
}

/// Always fails with the given error
pub struct FailingFetcher(pub ExError);

#[async_trait]
impl Fetcher for FailingFetcher {
    fn source_name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self) -> Result<Value> {
        Err(self.0.clone())
    }
}

/// Never answers within any test timeout
pub struct SlowFetcher;

#[async_trait]
impl Fetcher for SlowFetcher {
    fn source_name(&self) -> &str {
        "slow"
    }

    async fn fetch(&self) -> Result<Value> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }
}

/// Signals `started` when called, then waits for `release`
pub struct GatedFetcher {
    pub started: Notify,
    pub release: Notify,
    pub payload: Value,
}

impl GatedFetcher {
    pub fn new(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            payload,
        })
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    fn source_name(&self) -> &str {
        "gated"
    }

    async fn fetch(&self) -> Result<Value> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.payload.clone())
    }
}

pub struct FailingRenderer;

#[async_trait]
impl Renderer for FailingRenderer {
    async fn render(&self, _layout: &DataLayout, _dataset: &TrailDataset) -> Result<Value> {
        Err(ExError::new(ExErrorKind::Io)
            .with_op("render")
            .with_message("disk full"))
    }
}

/// Counts calls and records the record count it was handed
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: AtomicUsize,
    pub last_count: AtomicUsize,
}

#[async_trait]
impl Renderer for CountingRenderer {
    async fn render(&self, _layout: &DataLayout, dataset: &TrailDataset) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_count.store(dataset.record_count(), Ordering::SeqCst);
        Ok(json!({"rendered": dataset.record_count()}))
    }
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        retention: 30,
        fetch_timeout: Duration::from_secs(5),
        run_timeout: Duration::from_secs(30),
    }
}

pub fn store_in(dir: &TempDir) -> SnapshotStore {
    SnapshotStore::new(DataLayout::new(dir.path().join("data").join("trails.json")))
}

pub fn orchestrator(
    dir: &TempDir,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
    config: OrchestratorConfig,
) -> Orchestrator {
    let enricher: Arc<dyn Enricher> = Arc::new(NoopEnricher);
    Orchestrator::new(store_in(dir), fetcher, enricher, renderer, config)
}

/// Orchestrator with no-op rebuild collaborators
pub fn setup(fetcher: Arc<dyn Fetcher>) -> (TempDir, Orchestrator) {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir, fetcher, Arc::new(NoopRenderer), test_config());
    (dir, orch)
}
