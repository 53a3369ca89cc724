//! Typed trail-status dataset
//!
//! Candidate payloads travel through the pipeline as raw JSON until the
//! Validation Gate accepts them. Only then are they lifted into these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operational status of a single trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailStatus {
    Open,
    PartiallyOpen,
    PartiallyClosed,
    Closed,
}

impl TrailStatus {
    pub const ALL: [TrailStatus; 4] = [
        TrailStatus::Open,
        TrailStatus::PartiallyOpen,
        TrailStatus::PartiallyClosed,
        TrailStatus::Closed,
    ];

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailStatus::Open => "open",
            TrailStatus::PartiallyOpen => "partially_open",
            TrailStatus::PartiallyClosed => "partially_closed",
            TrailStatus::Closed => "closed",
        }
    }
}

/// One trail entry (`code` is unique within its island group)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailRecord {
    pub code: String,
    pub name: String,
    pub status: TrailStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Ordered trails of one island
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandGroup {
    pub island: String,
    pub trails: Vec<TrailRecord>,
}

/// Where a payload's data came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub kind: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}

/// The canonical dataset, as published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailDataset {
    pub generated_at: DateTime<Utc>,
    pub island_groups: Vec<IslandGroup>,
    pub status_legend: BTreeMap<TrailStatus, String>,
    pub sources: Vec<SourceRecord>,
}

impl TrailDataset {
    /// Total number of trail records across all island groups
    pub fn record_count(&self) -> usize {
        self.island_groups.iter().map(|g| g.trails.len()).sum()
    }

    /// Records of one island, if the island is present
    pub fn island(&self, island: &str) -> Option<&IslandGroup> {
        self.island_groups.iter().find(|g| g.island == island)
    }
}
