//! End-to-end scenarios through the engagement manager

use anyhow::Result;
use tempfile::TempDir;

use redtrack::engagement::models::{
    Asset, AssetKind, EntityRef, Finding, FindingStatus, Person, Project, Severity,
    SocialPlatform, SocialProfile,
};
use redtrack::engagement::{EngagementError, EngagementManager};
use redtrack::stats::BucketWidth;

fn manager() -> EngagementManager {
    EngagementManager::in_memory().expect("in-memory manager")
}

fn seed_project(manager: &EngagementManager, id: &str) {
    let project = Project::new(id, format!("{id} assessment"), "megacorp.io")
        .with_scope(vec!["*.megacorp.io".into()]);
    manager.create_project(&project, "operator1").unwrap();
}

#[test]
fn stats_follow_finding_lifecycle() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");

    // Fresh project: nothing counted
    assert_eq!(manager.project_stats("p1")?.findings, 0);

    // One critical finding appears in both the breakdown and the stats
    manager.findings().insert(&Finding::new(
        "VULN-001",
        "p1",
        "SQL injection in login form",
        Severity::Critical,
        "portal.megacorp.io",
    ))?;
    let breakdown = manager.severity_breakdown("p1")?;
    assert_eq!(breakdown.critical, 1);
    assert_eq!(breakdown.high, 0);
    assert_eq!(breakdown.medium, 0);
    assert_eq!(breakdown.low, 0);
    assert_eq!(manager.project_stats("p1")?.critical, 1);

    // Confirming the finding grows the activity log by exactly one event
    let before = manager.activity().count()?;
    manager.transition_finding("VULN-001", FindingStatus::Confirmed, "operator1")?;
    assert_eq!(manager.activity().count()?, before + 1);

    // confirmed -> to-triage is not a legal edge; the finding is unchanged
    let err = manager
        .transition_finding("VULN-001", FindingStatus::ToTriage, "operator1")
        .unwrap_err();
    assert!(matches!(err, EngagementError::InvalidTransition { .. }));
    assert_eq!(
        manager.findings().get("VULN-001")?.status,
        FindingStatus::Confirmed
    );

    Ok(())
}

#[test]
fn stats_invariant_survives_mutations() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");

    for i in 0..3 {
        manager
            .people()
            .insert(&Person::new(format!("per-{i}"), "p1", format!("Person {i}")))?;
        manager.assets().insert(&Asset::new(
            format!("a-{i}"),
            "p1",
            AssetKind::Subdomain,
            format!("host{i}.megacorp.io"),
        ))?;
        manager.findings().insert(&Finding::new(
            format!("VULN-00{i}"),
            "p1",
            format!("finding {i}"),
            if i == 0 { Severity::Critical } else { Severity::Medium },
            format!("host{i}.megacorp.io"),
        ))?;
    }

    // Stats equal live counts at every step of a mutation sequence
    manager.transition_finding("VULN-000", FindingStatus::Confirmed, "op")?;
    manager.transition_finding("VULN-001", FindingStatus::Remediated, "op")?;
    manager.assign_finding("VULN-002", Some("operator2"), "op")?;

    let stats = manager.project_stats("p1")?;
    assert_eq!(stats.people, manager.list_people("p1")?.len());
    assert_eq!(stats.assets, manager.list_assets("p1")?.len());
    assert_eq!(stats.findings, manager.list_findings("p1")?.len());
    assert_eq!(stats.critical, 1);

    // The board partitions everything exactly once
    let board = manager.status_board("p1")?;
    assert_eq!(board.len(), stats.findings);

    Ok(())
}

#[test]
fn reopen_returns_to_triage() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");
    manager.findings().insert(&Finding::new(
        "VULN-001",
        "p1",
        "Exposed admin panel",
        Severity::High,
        "admin.megacorp.io",
    ))?;

    manager.transition_finding("VULN-001", FindingStatus::Remediated, "op")?;
    let reopened = manager.reopen_finding("VULN-001", "op")?;
    assert_eq!(reopened.status, FindingStatus::ToTriage);

    Ok(())
}

#[test]
fn classifier_override_beats_evidence() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");

    let person = Person::new("per-1", "p1", "Sarah Chen")
        .with_email("sarah.chen@megacorp.io")
        .with_profile(SocialProfile::new(SocialPlatform::LinkedIn, "sarahchen", 1200));
    manager.people().insert(&person)?;

    // Corroborated profile + org email classifies high
    assert_eq!(
        manager.refresh_confidence("p1", "per-1")?.as_str(),
        "high"
    );

    // The override tag wins regardless of evidence
    let tagged = manager.tag_person("p1", "per-1", "confidence-override:low", "operator1")?;
    assert_eq!(tagged.confidence.as_str(), "low");
    assert_eq!(manager.people().get("p1", "per-1")?.confidence.as_str(), "low");

    // Removing the override restores the computed tier
    let untagged = manager.untag_person("p1", "per-1", "confidence-override:low", "operator1")?;
    assert_eq!(untagged.confidence.as_str(), "high");

    Ok(())
}

#[test]
fn cascade_delete_spares_the_feed() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");
    manager.findings().insert(&Finding::new(
        "VULN-001",
        "p1",
        "SSRF in image proxy",
        Severity::High,
        "img.megacorp.io",
    ))?;
    manager.transition_finding("VULN-001", FindingStatus::Confirmed, "op")?;

    manager.delete_project("p1", "operator1")?;

    assert!(matches!(
        manager.get_project("p1"),
        Err(EngagementError::NotFound { .. })
    ));
    assert!(matches!(
        manager.findings().get("VULN-001"),
        Err(EngagementError::NotFound { .. })
    ));

    // The feed keeps every event, including refs that now dangle
    let feed = manager.activity_feed(10)?;
    assert!(feed.iter().any(|e| e.entity == Some(EntityRef::finding("VULN-001"))));
    assert!(feed.iter().any(|e| e.description.starts_with("deleted project")));

    Ok(())
}

#[test]
fn timeline_counts_triage_activity() -> Result<()> {
    let manager = manager();
    seed_project(&manager, "p1");
    manager.findings().insert(&Finding::new(
        "VULN-001",
        "p1",
        "Weak TLS configuration",
        Severity::Low,
        "mail.megacorp.io",
    ))?;
    manager.transition_finding("VULN-001", FindingStatus::Confirmed, "op")?;

    let buckets = manager.activity_timeline(BucketWidth::Week)?;
    // Everything above happened "now", so one bucket holds it all
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].finding_events, 1);
    // Project creation referenced the project, not a finding or asset
    assert_eq!(buckets[0].other_events, 1);

    Ok(())
}

#[test]
fn persists_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("engagements.db");

    {
        let manager = EngagementManager::with_path(&path)?;
        seed_project(&manager, "p1");
        manager.findings().insert(&Finding::new(
            "VULN-001",
            "p1",
            "Default credentials on switch",
            Severity::Medium,
            "10.20.0.3",
        ))?;
    }

    let manager = EngagementManager::with_path(&path)?;
    assert_eq!(manager.list_projects()?.len(), 1);
    assert_eq!(manager.project_stats("p1")?.findings, 1);

    Ok(())
}
