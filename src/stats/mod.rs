//! Statistics rollups over engagement data
//!
//! Everything is computed on demand from live store contents - results are
//! never cached beyond the call that produced them, so a stats number always
//! equals what the entities say at that moment.
//!
//! ```ignore
//! let engine = manager.aggregates();
//!
//! let stats = engine.project_stats("proj-megacorp")?;
//! let global = engine.global_stats()?;
//! let board = AggregationEngine::status_board(manager.list_findings("proj-megacorp")?);
//! ```

mod models;
mod time_bucket;

pub use models::{
    ActivityBucket, BucketWidth, GlobalStats, ProjectStats, SeverityBreakdown, StatusBoard,
};
pub use time_bucket::{bucket_key, day_bucket, week_bucket};

use rusqlite::params;

use crate::engagement::models::{ActivityEvent, Finding, Severity};
use crate::engagement::{EngagementDb, EngagementError, Result};

/// Stateless aggregation over store contents
#[derive(Clone)]
pub struct AggregationEngine {
    db: EngagementDb,
}

impl AggregationEngine {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    /// Live counts of entities owned by one project.
    ///
    /// This is the number the dashboard's project cards must show; it is
    /// recomputed on every call rather than stored, so it cannot diverge
    /// from the owned entities.
    pub fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let conn = self.db.conn();

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE id = ?1",
            params![project_id],
            |r| r.get(0),
        )?;
        if exists == 0 {
            return Err(EngagementError::NotFound {
                kind: "project",
                id: project_id.to_string(),
            });
        }

        let people: i64 = conn.query_row(
            "SELECT COUNT(*) FROM people WHERE project_id = ?1",
            params![project_id],
            |r| r.get(0),
        )?;
        let assets: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assets WHERE project_id = ?1",
            params![project_id],
            |r| r.get(0),
        )?;
        let (findings, critical): (i64, i64) = conn.query_row(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN severity = 'critical' THEN 1 ELSE 0 END), 0) AS critical
            FROM findings
            WHERE project_id = ?1
            "#,
            params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(ProjectStats {
            people: people as usize,
            assets: assets as usize,
            findings: findings as usize,
            critical: critical as usize,
        })
    }

    /// Totals across projects: active engagements and all engagements as
    /// separately exposed aggregates.
    pub fn global_stats(&self) -> Result<GlobalStats> {
        let conn = self.db.conn();

        let (total_projects, active_projects): (i64, i64) = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0)
            FROM projects
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // (all, active-only) per owned table, via the owning project's status
        let count_pair = |sql: &str| -> Result<(i64, i64)> {
            Ok(conn.query_row(sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?)
        };

        let (people_all, people_active) = count_pair(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN pr.status = 'active' THEN 1 ELSE 0 END), 0) \
             FROM people p JOIN projects pr ON p.project_id = pr.id",
        )?;
        let (assets_all, assets_active) = count_pair(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN pr.status = 'active' THEN 1 ELSE 0 END), 0) \
             FROM assets a JOIN projects pr ON a.project_id = pr.id",
        )?;
        let (findings_all, findings_active): (i64, i64) = count_pair(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN pr.status = 'active' THEN 1 ELSE 0 END), 0) \
             FROM findings f JOIN projects pr ON f.project_id = pr.id",
        )?;
        let (critical_all, critical_active): (i64, i64) = count_pair(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN pr.status = 'active' THEN 1 ELSE 0 END), 0) \
             FROM findings f JOIN projects pr ON f.project_id = pr.id \
             WHERE f.severity = 'critical'",
        )?;

        Ok(GlobalStats {
            active: ProjectStats {
                people: people_active as usize,
                assets: assets_active as usize,
                findings: findings_active as usize,
                critical: critical_active as usize,
            },
            all: ProjectStats {
                people: people_all as usize,
                assets: assets_all as usize,
                findings: findings_all as usize,
                critical: critical_all as usize,
            },
            active_projects: active_projects as usize,
            total_projects: total_projects as usize,
        })
    }

    /// Count findings per severity tier.
    ///
    /// A real partition over per-finding data - never derived as fractions
    /// of a total.
    pub fn severity_breakdown(findings: &[Finding]) -> SeverityBreakdown {
        let mut breakdown = SeverityBreakdown::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => breakdown.critical += 1,
                Severity::High => breakdown.high += 1,
                Severity::Medium => breakdown.medium += 1,
                Severity::Low => breakdown.low += 1,
            }
        }
        breakdown
    }

    /// Partition findings into the four triage columns, preserving each
    /// column's relative insertion order.
    ///
    /// Complete by construction: every finding lands in exactly one column.
    /// A stored status outside the domain never gets here - strict row
    /// decoding already rejected it as a `DataIntegrity` error.
    pub fn status_board(findings: impl IntoIterator<Item = Finding>) -> StatusBoard {
        use crate::engagement::models::FindingStatus::*;
        let mut board = StatusBoard::default();
        for finding in findings {
            match finding.status {
                ToTriage => board.to_triage.push(finding),
                Confirmed => board.confirmed.push(finding),
                Exploitable => board.exploitable.push(finding),
                Remediated => board.remediated.push(finding),
            }
        }
        board
    }

    /// Calendar-aligned timeline buckets over an event sequence
    pub fn bucket_timeline(events: &[ActivityEvent], width: BucketWidth) -> Vec<ActivityBucket> {
        time_bucket::bucket_events(events, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::models::{
        Asset, AssetKind, FindingStatus, Person, Project, ProjectStatus,
    };
    use crate::engagement::{
        AssetRepository, FindingRepository, PersonRepository, ProjectRepository,
    };

    fn seeded() -> (EngagementDb, AggregationEngine) {
        let db = EngagementDb::open_in_memory().unwrap();
        (db.clone(), AggregationEngine::new(db))
    }

    fn finding(id: &str, project: &str, severity: Severity) -> Finding {
        Finding::new(id, project, format!("finding {id}"), severity, "asset")
    }

    #[test]
    fn test_project_stats_track_live_counts() {
        let (db, engine) = seeded();
        ProjectRepository::new(db.clone())
            .insert(&Project::new("p1", "Test", "megacorp.io"))
            .unwrap();

        assert_eq!(engine.project_stats("p1").unwrap(), ProjectStats::default());

        PersonRepository::new(db.clone())
            .insert(&Person::new("per-1", "p1", "Sarah Chen"))
            .unwrap();
        AssetRepository::new(db.clone())
            .insert(&Asset::new("a-1", "p1", AssetKind::Ip, "10.20.3.7"))
            .unwrap();
        let findings = FindingRepository::new(db.clone());
        findings.insert(&finding("VULN-001", "p1", Severity::Critical)).unwrap();
        findings.insert(&finding("VULN-002", "p1", Severity::Low)).unwrap();

        assert_eq!(
            engine.project_stats("p1").unwrap(),
            ProjectStats {
                people: 1,
                assets: 1,
                findings: 2,
                critical: 1,
            }
        );
    }

    #[test]
    fn test_project_stats_unknown_project() {
        let (_db, engine) = seeded();
        assert!(matches!(
            engine.project_stats("nope"),
            Err(EngagementError::NotFound { .. })
        ));
    }

    #[test]
    fn test_global_stats_split_by_project_status() {
        let (db, engine) = seeded();
        let projects = ProjectRepository::new(db.clone());
        projects.insert(&Project::new("p1", "Active", "a.io")).unwrap();
        projects
            .insert(&Project::new("p2", "Done", "b.io").with_status(ProjectStatus::Completed))
            .unwrap();

        let findings = FindingRepository::new(db.clone());
        findings.insert(&finding("VULN-001", "p1", Severity::Critical)).unwrap();
        findings.insert(&finding("VULN-002", "p2", Severity::Critical)).unwrap();
        findings.insert(&finding("VULN-003", "p2", Severity::Medium)).unwrap();

        let global = engine.global_stats().unwrap();
        assert_eq!(global.total_projects, 2);
        assert_eq!(global.active_projects, 1);
        assert_eq!(global.active.findings, 1);
        assert_eq!(global.active.critical, 1);
        assert_eq!(global.all.findings, 3);
        assert_eq!(global.all.critical, 2);
    }

    #[test]
    fn test_severity_breakdown_is_partition() {
        let findings = vec![
            finding("1", "p", Severity::Critical),
            finding("2", "p", Severity::High),
            finding("3", "p", Severity::High),
            finding("4", "p", Severity::Low),
        ];
        let breakdown = AggregationEngine::severity_breakdown(&findings);
        assert_eq!(breakdown.critical, 1);
        assert_eq!(breakdown.high, 2);
        assert_eq!(breakdown.medium, 0);
        assert_eq!(breakdown.low, 1);
        assert_eq!(breakdown.total(), findings.len());
    }

    #[test]
    fn test_status_board_complete_partition_in_order() {
        let findings = vec![
            finding("1", "p", Severity::Low).with_status(FindingStatus::Confirmed),
            finding("2", "p", Severity::Low),
            finding("3", "p", Severity::Low).with_status(FindingStatus::Confirmed),
            finding("4", "p", Severity::Low).with_status(FindingStatus::Remediated),
            finding("5", "p", Severity::Low),
        ];
        let count = findings.len();
        let board = AggregationEngine::status_board(findings);

        assert_eq!(board.len(), count);
        let confirmed: Vec<&str> = board.confirmed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(confirmed, vec!["1", "3"]);
        let triage: Vec<&str> = board.to_triage.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(triage, vec!["2", "5"]);
        assert_eq!(board.exploitable.len(), 0);
        assert_eq!(board.remediated.len(), 1);
    }
}
