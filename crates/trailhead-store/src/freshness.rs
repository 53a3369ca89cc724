//! Freshness of the canonical dataset

use crate::layout::DataLayout;
use serde_json::Value;
use std::fs;

/// `generated_at` of the canonical file, or `None` if it cannot be read
pub fn updated_at(layout: &DataLayout) -> Option<String> {
    let raw = fs::read(layout.data_file()).ok()?;
    let doc: Value = serde_json::from_slice(&raw).ok()?;
    doc.get("generated_at")
        .and_then(Value::as_str)
        .map(str::to_string)
}
