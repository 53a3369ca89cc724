//! Validation Gate
//!
//! The only authority on whether a candidate payload may become durable state.
//! A candidate is checked against the schema file that sits next to the data
//! file, plus the dataset rules JSON Schema cannot express; every violation is
//! collected so a rejection report lists all of them.

mod gate;

pub use gate::{ValidationFault, ValidationReport, Validator, BUNDLED_SCHEMA};
