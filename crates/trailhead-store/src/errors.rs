//! Error handling for trailhead-store
//!
//! Wraps trailhead-core ExError with store-specific helpers

use trailhead_core::errors::{ExError, ExErrorKind, TrailError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a persistence error wrapping the IO failure that caused it
pub fn persistence_error(operation: &str, cause: ExError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(operation.to_string())
        .with_message(cause.message().to_string())
        .with_source(cause)
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a snapshot-not-found error
pub fn snapshot_not_found(name: &str) -> ExError {
    TrailError::SnapshotNotFound {
        name: name.to_string(),
    }
    .into()
}

/// Create a malformed-snapshot error
pub fn malformed_snapshot(name: &str, err: serde_json::Error) -> ExError {
    TrailError::MalformedSnapshot {
        name: name.to_string(),
        reason: err.to_string(),
    }
    .into()
}
