//! Timestamp-derived snapshot names
//!
//! `trails_2024-01-01T06-10-00.123456Z.json`: ISO-8601 with the colons
//! replaced, fixed-width down to the microsecond.

use chrono::{DateTime, NaiveDateTime, Utc};

pub(crate) const PREFIX: &str = "trails_";
pub(crate) const SUFFIX: &str = ".json";
const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6fZ";
const STAMP_PARSE: &str = "%Y-%m-%dT%H-%M-%S%.fZ";

/// File name of a snapshot created at `at`
pub fn snapshot_name(at: DateTime<Utc>) -> String {
    format!("{}{}{}", PREFIX, at.format(STAMP_FORMAT), SUFFIX)
}

/// Creation time encoded in a snapshot name
pub fn parse_snapshot_name(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_PARSE)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether a directory entry belongs to the history
pub(crate) fn is_snapshot_file_name(name: &str) -> bool {
    name.starts_with(PREFIX) && name.ends_with(SUFFIX)
}
