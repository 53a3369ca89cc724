#![allow(clippy::result_large_err)]

use crate::atomic::atomic_write;
use crate::errors::{io_error, malformed_snapshot, persistence_error, serialization_error, Result};
use crate::layout::DataLayout;
use crate::snapshot::naming::{is_snapshot_file_name, parse_snapshot_name, snapshot_name};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use trailhead_core::validation::{Validator, BUNDLED_SCHEMA};
use trailhead_core::{log_op_end, log_op_start};

/// Number of snapshots kept after pruning unless configured otherwise
pub const DEFAULT_RETENTION: usize = 30;

/// One immutable entry of the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub path: PathBuf,
}

impl Snapshot {
    fn from_entry(dir: &Path, name: String) -> Self {
        let path = dir.join(&name);
        Self { name, path }
    }

    /// Creation time, if the name carries a valid timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_snapshot_name(&self.name)
    }
}

/// A snapshot that could not be deleted during pruning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneFailure {
    pub name: String,
    pub reason: String,
}

/// Per-item result of a pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub deleted: Vec<String>,
    pub failed: Vec<PruneFailure>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handle on the snapshot history of one data layout
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    layout: DataLayout,
}

impl SnapshotStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Create the data and history directories, and install the bundled
    /// schema if none is present. Idempotent.
    pub fn ensure_history(&self) -> Result<()> {
        fs::create_dir_all(self.layout.history_dir())
            .map_err(|e| io_error("create_history_dir", e))?;

        let schema_file = self.layout.schema_file();
        if !schema_file.exists() {
            atomic_write(&schema_file, BUNDLED_SCHEMA.as_bytes())?;
            tracing::info!(
                component = module_path!(),
                op = "ensure_history",
                schema = %schema_file.display(),
                "installed bundled schema"
            );
        }
        Ok(())
    }

    /// Validator compiled from the layout's schema file
    pub fn validator(&self) -> Result<Validator> {
        Validator::load(&self.layout.schema_file())
    }

    /// Write `payload` as a new snapshot named after the current time
    ///
    /// The payload must already have passed the Validation Gate.
    pub fn save_as_snapshot(&self, payload: &Value) -> Result<Snapshot> {
        self.save_as_snapshot_at(payload, Utc::now())
    }

    /// Write `payload` as a new snapshot named after `at`
    ///
    /// If `at` would not sort after the newest existing snapshot (clock
    /// stepped back, or two saves inside one microsecond), the name is moved
    /// to one microsecond past the newest so names stay strictly increasing.
    pub fn save_as_snapshot_at(&self, payload: &Value, at: DateTime<Utc>) -> Result<Snapshot> {
        let newest = self
            .list_snapshots()?
            .iter()
            .rev()
            .find_map(Snapshot::created_at);

        let mut stamp = at;
        if let Some(newest) = newest {
            if snapshot_name(stamp) <= snapshot_name(newest) {
                stamp = newest + Duration::microseconds(1);
            }
        }

        let history_dir = self.layout.history_dir();
        let mut name = snapshot_name(stamp);
        while history_dir.join(&name).exists() {
            stamp += Duration::microseconds(1);
            name = snapshot_name(stamp);
        }

        let content =
            serde_json::to_vec_pretty(payload).map_err(|e| serialization_error("save_snapshot", e))?;
        let snapshot = Snapshot::from_entry(&history_dir, name);
        atomic_write(&snapshot.path, &content)
            .map_err(|e| persistence_error("save_snapshot", e).with_snapshot(&snapshot.name))?;

        tracing::debug!(
            component = module_path!(),
            op = "save_snapshot",
            snapshot = %snapshot.name,
            bytes = content.len() as u64,
        );
        Ok(snapshot)
    }

    /// All snapshots, oldest first. Empty if the history directory is absent.
    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let dir = self.layout.history_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list_snapshots", e)),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_snapshot_file_name(name))
            .collect();
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| Snapshot::from_entry(&dir, name))
            .collect())
    }

    /// Exact-name lookup
    pub fn find_snapshot(&self, name: &str) -> Result<Option<Snapshot>> {
        Ok(self.list_snapshots()?.into_iter().find(|s| s.name == name))
    }

    /// Parse a snapshot's content
    pub fn read_snapshot(&self, snapshot: &Snapshot) -> Result<Value> {
        let raw = fs::read(&snapshot.path)
            .map_err(|e| io_error("read_snapshot", e).with_snapshot(&snapshot.name))?;
        serde_json::from_slice(&raw).map_err(|e| malformed_snapshot(&snapshot.name, e))
    }

    /// Delete the oldest snapshots so at most `retain` remain
    ///
    /// Best-effort: a file that cannot be removed is reported in
    /// `PruneReport::failed` and does not stop the rest.
    pub fn prune_snapshots(&self, retain: usize) -> Result<PruneReport> {
        let start = Instant::now();
        let snapshots = self.list_snapshots()?;
        let excess = snapshots.len().saturating_sub(retain);
        log_op_start!("prune_snapshots", retain = retain as u64, excess = excess as u64);

        let mut report = PruneReport::default();
        for snapshot in snapshots.into_iter().take(excess) {
            match fs::remove_file(&snapshot.path) {
                Ok(()) => report.deleted.push(snapshot.name),
                Err(e) => {
                    tracing::warn!(
                        component = module_path!(),
                        op = "prune_snapshots",
                        snapshot = %snapshot.name,
                        error = %e,
                        "could not delete snapshot"
                    );
                    report.failed.push(PruneFailure {
                        name: snapshot.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log_op_end!(
            "prune_snapshots",
            duration_ms = start.elapsed().as_millis() as u64,
            deleted = report.deleted.len() as u64,
            failed = report.failed.len() as u64
        );
        Ok(report)
    }

    /// Newest snapshot that still passes `validator`
    ///
    /// Unreadable or unparseable snapshots are skipped. Only used to recover
    /// from a missing canonical file.
    pub fn latest_good_snapshot(&self, validator: &Validator) -> Result<Option<Snapshot>> {
        for snapshot in self.list_snapshots()?.into_iter().rev() {
            match self.read_snapshot(&snapshot) {
                Ok(doc) => {
                    if validator.admit(&doc).is_ok() {
                        return Ok(Some(snapshot));
                    }
                    tracing::warn!(
                        component = module_path!(),
                        op = "latest_good_snapshot",
                        snapshot = %snapshot.name,
                        "snapshot no longer validates"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        component = module_path!(),
                        op = "latest_good_snapshot",
                        snapshot = %snapshot.name,
                        error = %e,
                        "skipping unreadable snapshot"
                    );
                }
            }
        }
        Ok(None)
    }
}
