//! Aggregation result models
//!
//! Everything here is computed on demand from live store contents and never
//! persisted, so the numbers cannot drift from the entities they describe.

use serde::Serialize;

use crate::engagement::models::Finding;

/// Live per-project entity counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub people: usize,
    pub assets: usize,
    pub findings: usize,
    /// Findings with severity = critical
    pub critical: usize,
}

impl ProjectStats {
    pub fn add(&mut self, other: &ProjectStats) {
        self.people += other.people;
        self.assets += other.assets;
        self.findings += other.findings;
        self.critical += other.critical;
    }
}

/// Cross-project totals: active engagements and all engagements, separately
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    /// Sum over projects with status = active
    pub active: ProjectStats,
    /// Sum over all projects regardless of status
    pub all: ProjectStats,
    pub active_projects: usize,
    pub total_projects: usize,
}

/// Finding counts per severity tier - a partition, not a ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityBreakdown {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Findings partitioned into the four triage columns.
///
/// Each column preserves the relative insertion order of its findings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusBoard {
    pub to_triage: Vec<Finding>,
    pub confirmed: Vec<Finding>,
    pub exploitable: Vec<Finding>,
    pub remediated: Vec<Finding>,
}

impl StatusBoard {
    /// Combined size of all columns - always equals the input count
    pub fn len(&self) -> usize {
        self.to_triage.len() + self.confirmed.len() + self.exploitable.len() + self.remediated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bucket width for the activity timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    /// Calendar days, UTC
    Day,
    /// ISO-8601 weeks (Monday-aligned), UTC
    Week,
}

/// Event counts for one calendar bucket, split by referenced entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityBucket {
    /// Bucket key: "YYYY-MM-DD" for days, "YYYY-Www" for weeks
    pub bucket: String,
    /// Events referencing a finding
    pub finding_events: usize,
    /// Events referencing an asset
    pub asset_events: usize,
    /// Everything else (projects, people, unreferenced events)
    pub other_events: usize,
}

impl ActivityBucket {
    pub fn total(&self) -> usize {
        self.finding_events + self.asset_events + self.other_events
    }
}
