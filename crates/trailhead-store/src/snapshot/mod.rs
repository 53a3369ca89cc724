//! Snapshot Store
//!
//! Append-only history of validated payloads. Snapshots are named after their
//! creation time so lexicographic order is chronological order; retention and
//! "newest" are both defined on that order.

mod history;
mod naming;

pub use history::{PruneFailure, PruneReport, Snapshot, SnapshotStore, DEFAULT_RETENTION};
pub use naming::{parse_snapshot_name, snapshot_name};
