//! Person model - intelligence records discovered during reconnaissance

use serde::{Deserialize, Serialize};

/// Social platform a profile was found on (open set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SocialPlatform {
    LinkedIn,
    GitHub,
    Twitter,
    Other(String),
}

impl SocialPlatform {
    pub fn as_str(&self) -> &str {
        match self {
            SocialPlatform::LinkedIn => "LinkedIn",
            SocialPlatform::GitHub => "GitHub",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Other(name) => name,
        }
    }
}

impl From<String> for SocialPlatform {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "linkedin" => SocialPlatform::LinkedIn,
            "github" => SocialPlatform::GitHub,
            "twitter" | "x" => SocialPlatform::Twitter,
            _ => SocialPlatform::Other(s),
        }
    }
}

impl From<SocialPlatform> for String {
    fn from(p: SocialPlatform) -> Self {
        p.as_str().to_string()
    }
}

/// A social profile linked to a discovered person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    pub platform: SocialPlatform,
    pub handle: String,
    /// Followers for social networks, public repos for GitHub
    #[serde(default)]
    pub audience: u32,
}

impl SocialProfile {
    pub fn new(platform: SocialPlatform, handle: impl Into<String>, audience: u32) -> Self {
        Self {
            platform,
            handle: handle.into(),
            audience,
        }
    }

    /// A profile corroborates a person when it carries a real handle with a
    /// visible audience.
    pub fn is_verifiable(&self) -> bool {
        !self.handle.trim().is_empty() && self.audience > 0
    }
}

/// A breach/leak record associated with a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakRecord {
    /// Breach corpus or paste source name
    pub source: String,
    /// What leaked, e.g., "credentials", "email+password"
    pub kind: String,
    /// Date of the leak, e.g., "2023-08"
    pub date: String,
}

/// How reliable a discovered person record is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    #[default]
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(ConfidenceTier::High),
            "medium" | "med" => Some(ConfidenceTier::Medium),
            "low" => Some(ConfidenceTier::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person discovered during reconnaissance
///
/// Identifiers are unique within their project; the store keys people by
/// `(project_id, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    /// Project this person belongs to
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Discovery provenance, e.g., "LinkedIn enumeration"
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub social_profiles: Vec<SocialProfile>,
    #[serde(default)]
    pub leaked_data: Vec<LeakRecord>,
    /// Derived by the confidence classifier; an override tag wins
    #[serde(default)]
    pub confidence: ConfidenceTier,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Discovery timestamp (ms since epoch)
    pub discovered_at: i64,
}

impl Person {
    /// Create a new person with minimal required fields
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: name.into(),
            title: None,
            email: None,
            source: String::new(),
            social_profiles: Vec::new(),
            leaked_data: Vec::new(),
            confidence: ConfidenceTier::Low,
            tags: Vec::new(),
            discovered_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_profile(mut self, profile: SocialProfile) -> Self {
        self.social_profiles.push(profile);
        self
    }

    pub fn with_leak(mut self, leak: LeakRecord) -> Self {
        self.leaked_data.push(leak);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
