//! Trailhead Store - durable state of the pipeline
//!
//! Provides:
//! - `DataLayout`: every path derived from the one configured data-file location
//! - Atomic temp→rename writes shared by snapshot creation and promotion
//! - `PublishLock`: the cross-process lock held while a run or rollback publishes
//! - The Snapshot Store (history, retention pruning, latest-valid lookup)
//! - The Promotion Protocol and the freshness read of the canonical file

pub mod atomic;
pub mod errors;
pub mod freshness;
pub mod layout;
pub mod lock;
pub mod promote;
pub mod snapshot;

// Re-export key types
pub use errors::Result;
pub use layout::DataLayout;
pub use lock::PublishLock;
pub use promote::promote;
pub use snapshot::{PruneFailure, PruneReport, Snapshot, SnapshotStore, DEFAULT_RETENTION};
