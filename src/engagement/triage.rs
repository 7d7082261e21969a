//! Finding triage state machine
//!
//! Governs the legal status transitions of findings and writes the audit
//! trail. Every compound operation (finding mutation + activity append +
//! project last-activity bump) commits in a single transaction: a reader
//! never observes a status change without its corresponding event.
//!
//! Allowed forward edges:
//!
//! ```text
//! to-triage ──> confirmed ──> exploitable
//!     │             │              │
//!     └─────────────┴──────────────┴──> remediated ──(reopen)──> to-triage
//! ```

use tracing::info;

use super::db::EngagementDb;
use super::error::{EngagementError, Result};
use super::models::{ActivityEvent, EntityRef, Finding, FindingStatus};
use super::repository::{append_event, fetch_finding, touch_project};

/// State machine over finding statuses.
///
/// Assignment is independent of status and legal in any state.
#[derive(Clone)]
pub struct TriageStateMachine {
    db: EngagementDb,
}

impl TriageStateMachine {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    /// Move a finding along a forward edge.
    ///
    /// Fails with `InvalidTransition` when the edge is not in the allowed
    /// set, leaving the finding unchanged. `remediated` has no forward
    /// exits - use [`reopen`](Self::reopen).
    pub fn transition(
        &self,
        finding_id: &str,
        target: FindingStatus,
        actor: &str,
    ) -> Result<Finding> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let finding = fetch_finding(&tx, finding_id)?;
        if !finding.status.can_transition_to(target) {
            return Err(EngagementError::InvalidTransition {
                from: finding.status,
                to: target,
            });
        }

        let description = format!(
            "moved \"{}\" from {} to {}",
            finding.title, finding.status, target
        );
        let updated = self.apply_status(&tx, &finding, target, actor, description)?;
        tx.commit()?;

        info!(
            finding = finding_id,
            from = %finding.status,
            to = %target,
            actor,
            "triage transition"
        );
        Ok(updated)
    }

    /// Reopen a remediated finding back to `to-triage`.
    ///
    /// Logged distinctly from forward transitions; any other starting state
    /// is an `InvalidTransition`.
    pub fn reopen(&self, finding_id: &str, actor: &str) -> Result<Finding> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let finding = fetch_finding(&tx, finding_id)?;
        if finding.status != FindingStatus::Remediated {
            return Err(EngagementError::InvalidTransition {
                from: finding.status,
                to: FindingStatus::ToTriage,
            });
        }

        let description = format!("reopened \"{}\"", finding.title);
        let updated =
            self.apply_status(&tx, &finding, FindingStatus::ToTriage, actor, description)?;
        tx.commit()?;

        info!(finding = finding_id, actor, "finding reopened");
        Ok(updated)
    }

    /// Assign or unassign a finding. Legal in any status.
    pub fn assign(
        &self,
        finding_id: &str,
        assignee: Option<&str>,
        actor: &str,
    ) -> Result<Finding> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let mut finding = fetch_finding(&tx, finding_id)?;
        let now = chrono::Utc::now().timestamp_millis();

        tx.execute(
            "UPDATE findings SET assigned_to = ?2 WHERE id = ?1",
            rusqlite::params![finding_id, assignee],
        )?;
        let description = match assignee {
            Some(member) => format!("assigned \"{}\" to {member}", finding.title),
            None => format!("unassigned \"{}\"", finding.title),
        };
        append_event(
            &tx,
            &ActivityEvent::new(actor, description).for_entity(EntityRef::finding(finding_id)),
        )?;
        touch_project(&tx, &finding.project_id, now)?;
        tx.commit()?;

        finding.assigned_to = assignee.map(str::to_string);
        Ok(finding)
    }

    fn apply_status(
        &self,
        tx: &rusqlite::Transaction<'_>,
        finding: &Finding,
        target: FindingStatus,
        actor: &str,
        description: String,
    ) -> Result<Finding> {
        let now = chrono::Utc::now().timestamp_millis();
        tx.execute(
            "UPDATE findings SET status = ?2, updated_at = ?3 WHERE id = ?1",
            rusqlite::params![finding.id, target.as_str(), now],
        )?;
        append_event(
            tx,
            &ActivityEvent::new(actor, description).for_entity(EntityRef::finding(&finding.id)),
        )?;
        touch_project(tx, &finding.project_id, now)?;

        let mut updated = finding.clone();
        updated.status = target;
        updated.updated_at = now;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::models::{Project, Severity};
    use crate::engagement::repository::{
        ActivityRepository, FindingRepository, ProjectRepository,
    };

    fn seeded() -> (EngagementDb, TriageStateMachine) {
        let db = EngagementDb::open_in_memory().unwrap();
        ProjectRepository::new(db.clone())
            .insert(&Project::new("p1", "Test", "megacorp.io"))
            .unwrap();
        FindingRepository::new(db.clone())
            .insert(&Finding::new(
                "VULN-001",
                "p1",
                "SQL injection in login form",
                Severity::Critical,
                "portal.megacorp.io",
            ))
            .unwrap();
        let triage = TriageStateMachine::new(db.clone());
        (db, triage)
    }

    #[test]
    fn test_forward_path() {
        let (db, triage) = seeded();
        let f = triage
            .transition("VULN-001", FindingStatus::Confirmed, "operator1")
            .unwrap();
        assert_eq!(f.status, FindingStatus::Confirmed);

        let f = triage
            .transition("VULN-001", FindingStatus::Exploitable, "operator1")
            .unwrap();
        assert_eq!(f.status, FindingStatus::Exploitable);

        let f = triage
            .transition("VULN-001", FindingStatus::Remediated, "operator1")
            .unwrap();
        assert_eq!(f.status, FindingStatus::Remediated);

        // One audit event per transition
        assert_eq!(ActivityRepository::new(db).count().unwrap(), 3);
    }

    #[test]
    fn test_illegal_edge_leaves_finding_unchanged() {
        let (db, triage) = seeded();
        triage
            .transition("VULN-001", FindingStatus::Confirmed, "operator1")
            .unwrap();

        // confirmed -> to-triage is not a legal edge
        let err = triage
            .transition("VULN-001", FindingStatus::ToTriage, "operator1")
            .unwrap_err();
        assert!(matches!(
            err,
            EngagementError::InvalidTransition {
                from: FindingStatus::Confirmed,
                to: FindingStatus::ToTriage,
            }
        ));

        let findings = FindingRepository::new(db.clone());
        assert_eq!(
            findings.get("VULN-001").unwrap().status,
            FindingStatus::Confirmed
        );
        // Failed transition must not leave an audit event behind
        assert_eq!(ActivityRepository::new(db).count().unwrap(), 1);
    }

    #[test]
    fn test_skipping_confirmed_is_illegal() {
        let (_db, triage) = seeded();
        assert!(triage
            .transition("VULN-001", FindingStatus::Exploitable, "operator1")
            .is_err());
    }

    #[test]
    fn test_remediate_from_triage_directly() {
        let (_db, triage) = seeded();
        // Proactively patched without ever being confirmed
        let f = triage
            .transition("VULN-001", FindingStatus::Remediated, "operator1")
            .unwrap();
        assert_eq!(f.status, FindingStatus::Remediated);
    }

    #[test]
    fn test_reopen_only_from_remediated() {
        let (db, triage) = seeded();
        assert!(triage.reopen("VULN-001", "operator1").is_err());

        triage
            .transition("VULN-001", FindingStatus::Remediated, "operator1")
            .unwrap();
        let f = triage.reopen("VULN-001", "operator1").unwrap();
        assert_eq!(f.status, FindingStatus::ToTriage);

        // Reopen is logged with its own wording
        let feed = ActivityRepository::new(db).recent(1).unwrap();
        assert!(feed[0].description.starts_with("reopened"));
    }

    #[test]
    fn test_transition_to_triage_reserved_for_reopen() {
        let (_db, triage) = seeded();
        triage
            .transition("VULN-001", FindingStatus::Remediated, "operator1")
            .unwrap();
        // The generic operation refuses the reopen edge
        assert!(triage
            .transition("VULN-001", FindingStatus::ToTriage, "operator1")
            .is_err());
    }

    #[test]
    fn test_assign_in_any_state() {
        let (db, triage) = seeded();
        let f = triage
            .assign("VULN-001", Some("operator2"), "operator1")
            .unwrap();
        assert_eq!(f.assigned_to.as_deref(), Some("operator2"));

        triage
            .transition("VULN-001", FindingStatus::Remediated, "operator1")
            .unwrap();
        let f = triage.assign("VULN-001", None, "operator1").unwrap();
        assert_eq!(f.assigned_to, None);

        let stored = FindingRepository::new(db).get("VULN-001").unwrap();
        assert_eq!(stored.assigned_to, None);
    }

    #[test]
    fn test_unknown_finding() {
        let (_db, triage) = seeded();
        assert!(matches!(
            triage.transition("VULN-404", FindingStatus::Confirmed, "op"),
            Err(EngagementError::NotFound { .. })
        ));
    }
}
