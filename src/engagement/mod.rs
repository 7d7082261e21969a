//! Engagement tracking module
//!
//! Provides project management, recon intelligence (people, assets), finding
//! triage, and the append-only activity feed behind the dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     EngagementManager                           │
//! │  - Project CRUD + scope edits                                   │
//! │  - Person tagging + confidence classification                   │
//! │  - Finding triage (state machine + audit trail)                 │
//! │  - Batch ingestion                                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                  ~/.redtrack/engagements.db
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let manager = EngagementManager::new()?;
//!
//! // Create an engagement
//! let project = Project::new("proj-megacorp", "MegaCorp External", "megacorp.io")
//!     .with_scope(vec!["*.megacorp.io".into()]);
//! manager.create_project(&project, "operator1")?;
//!
//! // Record a finding and move it through triage
//! manager.findings().insert(&Finding::new(
//!     "VULN-001", "proj-megacorp", "SQLi in login form",
//!     Severity::Critical, "portal.megacorp.io",
//! ))?;
//! manager.transition_finding("VULN-001", FindingStatus::Confirmed, "operator1")?;
//!
//! // Dashboard numbers, always live
//! let stats = manager.project_stats("proj-megacorp")?;
//! ```

mod db;
mod error;
mod ingest;
pub mod models;
mod repository;
mod triage;

pub use db::EngagementDb;
pub use error::{EngagementError, Result};
pub use ingest::{IngestBatch, IngestResult};
pub use models::*;
pub use repository::{
    ActivityRepository, AssetRepository, FindingRepository, PersonRepository, ProjectRepository,
};
pub use triage::TriageStateMachine;

use tracing::info;

use crate::recon;
use crate::stats::{
    ActivityBucket, AggregationEngine, BucketWidth, GlobalStats, ProjectStats, SeverityBreakdown,
    StatusBoard,
};
use repository::{
    append_event, delete_project, fetch_person, fetch_project, insert_project,
    persist_person_fields, set_project_scope, touch_project,
};

/// Central manager for engagement tracking
///
/// High-level API over projects, people, assets, findings, and the activity
/// feed. Mutations that the dashboard exposes (tagging, triage, scope edits)
/// commit together with their audit event.
#[derive(Clone)]
pub struct EngagementManager {
    db: EngagementDb,
}

impl EngagementManager {
    /// Create a manager on the default database location
    pub fn new() -> Result<Self> {
        Ok(Self {
            db: EngagementDb::open_default()?,
        })
    }

    /// Create a manager on a custom database path
    pub fn with_path(path: &std::path::Path) -> Result<Self> {
        Ok(Self {
            db: EngagementDb::open(path)?,
        })
    }

    /// Create a manager on a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: EngagementDb::open_in_memory()?,
        })
    }

    // ============================================
    // Component accessors
    // ============================================

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.db.clone())
    }

    pub fn people(&self) -> PersonRepository {
        PersonRepository::new(self.db.clone())
    }

    pub fn assets(&self) -> AssetRepository {
        AssetRepository::new(self.db.clone())
    }

    pub fn findings(&self) -> FindingRepository {
        FindingRepository::new(self.db.clone())
    }

    pub fn activity(&self) -> ActivityRepository {
        ActivityRepository::new(self.db.clone())
    }

    pub fn triage(&self) -> TriageStateMachine {
        TriageStateMachine::new(self.db.clone())
    }

    pub fn aggregates(&self) -> AggregationEngine {
        AggregationEngine::new(self.db.clone())
    }

    /// Reset all data (for testing)
    pub fn reset_all(&self) -> Result<()> {
        self.db.reset_all()
    }

    // ============================================
    // Query surface (consumed by the dashboard)
    // ============================================

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.projects().list()
    }

    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.projects().get(id)
    }

    pub fn list_people(&self, project_id: &str) -> Result<Vec<Person>> {
        self.projects().get(project_id)?;
        self.people().list_by_project(project_id)
    }

    pub fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>> {
        self.projects().get(project_id)?;
        self.assets().list_by_project(project_id)
    }

    pub fn list_findings(&self, project_id: &str) -> Result<Vec<Finding>> {
        self.projects().get(project_id)?;
        self.findings().list_by_project(project_id)
    }

    /// Live counts for one project
    pub fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        self.aggregates().project_stats(project_id)
    }

    /// Live counts across projects: active-only and all, separately
    pub fn global_stats(&self) -> Result<GlobalStats> {
        self.aggregates().global_stats()
    }

    pub fn severity_breakdown(&self, project_id: &str) -> Result<SeverityBreakdown> {
        let findings = self.list_findings(project_id)?;
        Ok(AggregationEngine::severity_breakdown(&findings))
    }

    /// Triage board partition for one project, insertion order per column
    pub fn status_board(&self, project_id: &str) -> Result<StatusBoard> {
        let findings = self.list_findings(project_id)?;
        Ok(AggregationEngine::status_board(findings))
    }

    /// Most recent activity first
    pub fn activity_feed(&self, limit: usize) -> Result<Vec<ActivityEvent>> {
        self.activity().recent(limit)
    }

    /// Calendar-aligned event counts over the whole feed
    pub fn activity_timeline(&self, width: BucketWidth) -> Result<Vec<ActivityBucket>> {
        let events = self.activity().list_all()?;
        Ok(AggregationEngine::bucket_timeline(&events, width))
    }

    // ============================================
    // Mutation surface (consumed by the dashboard)
    // ============================================

    /// Create a project, logging the creation to the feed
    pub fn create_project(&self, project: &Project, actor: &str) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        insert_project(&tx, project)?;
        append_event(
            &tx,
            &ActivityEvent::new(actor, format!("created project \"{}\"", project.name))
                .for_entity(EntityRef::project(&project.id)),
        )?;
        tx.commit()?;
        info!(project = %project.id, actor, "project created");
        Ok(())
    }

    /// Delete a project and everything it owns. The deletion event stays in
    /// the feed with a (now dangling) reference to the project.
    pub fn delete_project(&self, project_id: &str, actor: &str) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let project = fetch_project(&tx, project_id)?;
        delete_project(&tx, project_id)?;
        append_event(
            &tx,
            &ActivityEvent::new(actor, format!("deleted project \"{}\"", project.name))
                .for_entity(EntityRef::project(project_id)),
        )?;
        tx.commit()?;
        info!(project = %project_id, actor, "project deleted");
        Ok(())
    }

    /// Replace a project's in-scope entries
    pub fn update_scope(&self, project_id: &str, scope: Vec<String>, actor: &str) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let project = fetch_project(&tx, project_id)?;
        let now = chrono::Utc::now().timestamp_millis();
        set_project_scope(&tx, project_id, &scope, now)?;
        append_event(
            &tx,
            &ActivityEvent::new(
                actor,
                format!(
                    "updated scope of \"{}\" ({} entries)",
                    project.name,
                    scope.len()
                ),
            )
            .for_entity(EntityRef::project(project_id)),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Add a tag to a person. Re-runs confidence classification so an
    /// override tag takes effect immediately.
    pub fn tag_person(
        &self,
        project_id: &str,
        person_id: &str,
        tag: &str,
        actor: &str,
    ) -> Result<Person> {
        if tag.trim().is_empty() {
            return Err(EngagementError::Validation("tag must not be empty".into()));
        }
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let mut person = fetch_person(&tx, project_id, person_id)?;
        let project = fetch_project(&tx, project_id)?;

        if !person.tags.iter().any(|t| t == tag) {
            person.tags.push(tag.to_string());
        }
        person.confidence = recon::classify(&person, &recon::org_domain(&project.target));
        persist_person_fields(&tx, &person)?;

        let now = chrono::Utc::now().timestamp_millis();
        append_event(
            &tx,
            &ActivityEvent::new(actor, format!("tagged \"{}\" with {tag}", person.name))
                .for_entity(EntityRef::person(person_id)),
        )?;
        touch_project(&tx, project_id, now)?;
        tx.commit()?;
        Ok(person)
    }

    /// Remove a tag from a person, re-running classification
    pub fn untag_person(
        &self,
        project_id: &str,
        person_id: &str,
        tag: &str,
        actor: &str,
    ) -> Result<Person> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let mut person = fetch_person(&tx, project_id, person_id)?;
        let project = fetch_project(&tx, project_id)?;

        person.tags.retain(|t| t != tag);
        person.confidence = recon::classify(&person, &recon::org_domain(&project.target));
        persist_person_fields(&tx, &person)?;

        let now = chrono::Utc::now().timestamp_millis();
        append_event(
            &tx,
            &ActivityEvent::new(actor, format!("removed tag {tag} from \"{}\"", person.name))
                .for_entity(EntityRef::person(person_id)),
        )?;
        touch_project(&tx, project_id, now)?;
        tx.commit()?;
        Ok(person)
    }

    /// Recompute and persist a person's confidence tier from current
    /// evidence. Idempotent; derived data, so nothing is logged.
    pub fn refresh_confidence(&self, project_id: &str, person_id: &str) -> Result<ConfidenceTier> {
        let conn = self.db.conn();
        let mut person = fetch_person(&conn, project_id, person_id)?;
        let project = fetch_project(&conn, project_id)?;
        person.confidence = recon::classify(&person, &recon::org_domain(&project.target));
        persist_person_fields(&conn, &person)?;
        Ok(person.confidence)
    }

    /// Move a finding along a forward triage edge
    pub fn transition_finding(
        &self,
        finding_id: &str,
        target: FindingStatus,
        actor: &str,
    ) -> Result<Finding> {
        self.triage().transition(finding_id, target, actor)
    }

    /// Assign (`Some`) or unassign (`None`) a finding
    pub fn assign_finding(
        &self,
        finding_id: &str,
        assignee: Option<&str>,
        actor: &str,
    ) -> Result<Finding> {
        self.triage().assign(finding_id, assignee, actor)
    }

    /// Reopen a remediated finding back to triage
    pub fn reopen_finding(&self, finding_id: &str, actor: &str) -> Result<Finding> {
        self.triage().reopen(finding_id, actor)
    }

    /// Append an arbitrary event to the feed
    pub fn record_event(&self, event: &ActivityEvent) -> Result<()> {
        self.activity().append(event)
    }

    /// Ingest a batch of already-parsed records
    pub fn ingest(&self, batch: &IngestBatch) -> Result<IngestResult> {
        ingest::ingest(self, batch)
    }
}
