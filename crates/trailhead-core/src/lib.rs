//! Trailhead Core - dataset model, validation gate and shared facilities
//!
//! This crate provides the pieces every other trailhead crate builds on:
//! - The typed trail-status dataset (`TrailDataset`, `TrailStatus`, ...)
//! - The Validation Gate that decides whether a candidate payload may become durable
//! - The structured error facility (`ExError`, `ExErrorKind`, `TrailError`)
//! - The structured logging facility (`log_op_start!` and friends)

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod validation;

#[doc(hidden)]
pub use trailhead_core_types as __types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, TrailError};
pub use model::{IslandGroup, SourceRecord, TrailDataset, TrailRecord, TrailStatus};
pub use validation::{ValidationFault, ValidationReport, Validator};
