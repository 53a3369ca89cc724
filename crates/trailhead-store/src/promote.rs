//! Promotion Protocol
//!
//! Copies a snapshot's bytes over the canonical file with the atomic-write
//! primitive. No validation happens here: snapshots were validated when they
//! were written, and an administrator picking one for rollback vouches for it.

#![allow(clippy::result_large_err)]

use crate::atomic::atomic_write;
use crate::errors::{io_error, persistence_error, Result};
use crate::layout::DataLayout;
use crate::snapshot::Snapshot;
use std::fs;
use std::time::Instant;
use trailhead_core::{log_op_end, log_op_error, log_op_start};

/// Make `snapshot` the canonical dataset
///
/// On failure the previous canonical content is left in place.
pub fn promote(layout: &DataLayout, snapshot: &Snapshot) -> Result<()> {
    let start = Instant::now();
    log_op_start!("promote", snapshot = %snapshot.name);

    let result = fs::read(&snapshot.path)
        .map_err(|e| io_error("read_snapshot", e))
        .and_then(|content| atomic_write(layout.data_file(), &content))
        .map_err(|e| persistence_error("promote", e).with_snapshot(&snapshot.name));

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(()) => {
            log_op_end!("promote", duration_ms = duration_ms, snapshot = %snapshot.name);
        }
        Err(e) => {
            log_op_error!("promote", e.clone(), duration_ms = duration_ms, snapshot = %snapshot.name);
        }
    }
    result
}
