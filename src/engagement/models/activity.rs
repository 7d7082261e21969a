//! Activity events - the append-only audit feed

use serde::{Deserialize, Serialize};

/// Kind of entity an activity event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Person,
    Asset,
    Finding,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Person => "person",
            EntityKind::Asset => "asset",
            EntityKind::Finding => "finding",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "project" => Some(EntityKind::Project),
            "person" => Some(EntityKind::Person),
            "asset" => Some(EntityKind::Asset),
            "finding" => Some(EntityKind::Finding),
            _ => None,
        }
    }
}

/// Weak reference to the entity an event was recorded against.
///
/// Lookup only - no ownership. Refs may dangle after a project cascade
/// delete; that is tolerated, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn project(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Project,
            id: id.into(),
        }
    }

    pub fn person(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Person,
            id: id.into(),
        }
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Asset,
            id: id.into(),
        }
    }

    pub fn finding(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Finding,
            id: id.into(),
        }
    }
}

/// One entry in the activity feed. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    /// Who did it (team member identifier)
    pub actor: String,
    /// Human-readable description, e.g., "moved \"SQLi\" from to-triage to confirmed"
    pub description: String,
    /// When it happened (ms since epoch)
    pub timestamp: i64,
    /// The entity that produced the event, if any
    #[serde(default)]
    pub entity: Option<EntityRef>,
}

impl ActivityEvent {
    /// Create a new event stamped with a fresh id and the current time
    pub fn new(actor: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor: actor.into(),
            description: description.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            entity: None,
        }
    }

    pub fn for_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}
