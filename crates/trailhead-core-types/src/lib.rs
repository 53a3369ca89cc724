//! Core types shared across trailhead facilities
//!
//! This crate provides foundational types used by the error handling,
//! logging, and pipeline layers:
//!
//! - **Correlation types**: RunId for tying every log line of one refresh run together
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RunId;
pub use sensitive::Sensitive;
