//! Project model for red team engagements

use serde::{Deserialize, Serialize};

/// Lifecycle status of an engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "completed" | "complete" | "done" => Some(ProjectStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A red team engagement project
///
/// Owns the people, assets, and findings discovered during the engagement.
/// Per-project counts are never stored on the project row - they are always
/// computed live by the stats engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier, e.g., "proj-megacorp"
    pub id: String,
    /// Display name, e.g., "MegaCorp External Assessment"
    pub name: String,
    /// Target scope descriptor, e.g., "megacorp.io"
    pub target: String,
    /// In-scope entries, in the order they were agreed
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Whether an NDA covers this engagement
    #[serde(default)]
    pub nda_flag: bool,
    /// Team member identifiers, insertion-ordered, no duplicates
    #[serde(default)]
    pub team: Vec<String>,
    /// Created timestamp (ms since epoch)
    pub created_at: i64,
    /// Last mutation touching this project (ms since epoch)
    pub last_activity_at: i64,
}

impl Project {
    /// Create a new active project with minimal required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, target: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: id.into(),
            name: name.into(),
            target: target.into(),
            scope: Vec::new(),
            status: ProjectStatus::Active,
            nda_flag: false,
            team: Vec::new(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn with_scope(mut self, scope: Vec<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_nda(mut self) -> Self {
        self.nda_flag = true;
        self
    }

    pub fn with_team_member(mut self, member: impl Into<String>) -> Self {
        self.team.push(member.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_builder() {
        let project = Project::new("proj-megacorp", "MegaCorp External", "megacorp.io")
            .with_scope(vec!["*.megacorp.io".into(), "10.20.0.0/16".into()])
            .with_nda()
            .with_team_member("operator1")
            .with_team_member("operator2");

        assert_eq!(project.id, "proj-megacorp");
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(project.nda_flag);
        assert_eq!(project.scope.len(), 2);
        assert_eq!(project.team, vec!["operator1", "operator2"]);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(ProjectStatus::from_str("active"), Some(ProjectStatus::Active));
        assert_eq!(
            ProjectStatus::from_str("COMPLETED"),
            Some(ProjectStatus::Completed)
        );
        assert_eq!(ProjectStatus::from_str("archived"), None);
    }
}
