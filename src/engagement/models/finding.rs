//! Finding model - the triage card for vulnerability tracking

use serde::{Deserialize, Serialize};

/// Severity levels for findings, critical highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" | "crit" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" | "med" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Rank for ordering, 0 = most severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Total order with critical greatest
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding status - the triage board columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingStatus {
    /// Fresh from ingestion, unreviewed
    #[default]
    ToTriage,
    /// Manually confirmed real
    Confirmed,
    /// Exploitation demonstrated
    Exploitable,
    /// Fixed or mitigated by the target
    Remediated,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::ToTriage => "to-triage",
            FindingStatus::Confirmed => "confirmed",
            FindingStatus::Exploitable => "exploitable",
            FindingStatus::Remediated => "remediated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "to-triage" | "to_triage" | "totriage" => Some(FindingStatus::ToTriage),
            "confirmed" => Some(FindingStatus::Confirmed),
            "exploitable" => Some(FindingStatus::Exploitable),
            "remediated" => Some(FindingStatus::Remediated),
            _ => None,
        }
    }

    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, FindingStatus::Remediated)
    }

    /// Board column index (for stable column ordering)
    pub fn column_index(&self) -> u8 {
        match self {
            FindingStatus::ToTriage => 0,
            FindingStatus::Confirmed => 1,
            FindingStatus::Exploitable => 2,
            FindingStatus::Remediated => 3,
        }
    }

    /// Whether the forward triage edge `self -> target` is legal.
    ///
    /// Leaving `remediated` is reserved to the distinct reopen operation and
    /// is never a legal forward edge.
    pub fn can_transition_to(&self, target: FindingStatus) -> bool {
        use FindingStatus::*;
        matches!(
            (self, target),
            (ToTriage, Confirmed)
                | (ToTriage, Remediated)
                | (Confirmed, Exploitable)
                | (Confirmed, Remediated)
                | (Exploitable, Remediated)
        )
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vulnerability finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique ID, e.g., "VULN-001"
    pub id: String,
    /// Project this finding belongs to
    pub project_id: String,
    pub title: String,
    pub severity: Severity,
    /// Affected asset reference (asset id or value)
    pub asset: String,
    /// CVE identifier if known
    #[serde(default)]
    pub cve: Option<String>,
    /// CVSS base score, 0.0 - 10.0
    #[serde(default)]
    pub cvss: f64,
    #[serde(default)]
    pub status: FindingStatus,
    /// Assigned team member, if any
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Created timestamp (ms since epoch)
    pub created_at: i64,
    /// Last status transition (ms since epoch)
    pub updated_at: i64,
}

impl Finding {
    /// Create a new finding in the initial triage state
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        asset: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            severity,
            asset: asset.into(),
            cve: None,
            cvss: 0.0,
            status: FindingStatus::ToTriage,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_cve(mut self, cve: impl Into<String>) -> Self {
        self.cve = Some(cve.into());
        self
    }

    pub fn with_cvss(mut self, cvss: f64) -> Self {
        self.cvss = cvss;
        self
    }

    pub fn with_status(mut self, status: FindingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn assigned_to(mut self, member: impl Into<String>) -> Self {
        self.assigned_to = Some(member.into());
        self
    }
}
