//! Batch ingestion of already-parsed engagement records
//!
//! The collection side (scanners, scrapers, breach corpora) lives outside
//! this crate; it hands over structured batches in the §3 shapes and this
//! module writes them in dependency order.

use serde::Deserialize;
use tracing::info;

use super::EngagementManager;
use super::error::Result;
use super::models::{ActivityEvent, Asset, Finding, Person, Project};

/// A batch of records to ingest, in already-parsed form.
///
/// Transport and wire format are the collaborator's concern; anything that
/// deserializes into these shapes can be ingested.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestBatch {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub events: Vec<ActivityEvent>,
}

impl IngestBatch {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
            && self.people.is_empty()
            && self.assets.is_empty()
            && self.findings.is_empty()
            && self.events.is_empty()
    }
}

/// Counts of records written by one ingest call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestResult {
    pub projects: usize,
    pub people: usize,
    pub assets: usize,
    pub findings: usize,
    pub events: usize,
}

impl IngestResult {
    pub fn total(&self) -> usize {
        self.projects + self.people + self.assets + self.findings + self.events
    }
}

pub(super) fn ingest(manager: &EngagementManager, batch: &IngestBatch) -> Result<IngestResult> {
    let mut result = IngestResult::default();

    // Dependency order: owners before owned entities. Each write is atomic
    // on its own; a failure stops the batch with everything before it
    // committed and nothing after.
    for project in &batch.projects {
        manager.projects().upsert(project)?;
        result.projects += 1;
    }
    for person in &batch.people {
        manager.people().upsert(person)?;
        result.people += 1;
    }
    for asset in &batch.assets {
        manager.assets().upsert(asset)?;
        result.assets += 1;
    }
    for finding in &batch.findings {
        manager.findings().upsert(finding)?;
        result.findings += 1;
    }
    for event in &batch.events {
        manager.activity().append(event)?;
        result.events += 1;
    }

    if result.total() > 0 {
        info!(
            projects = result.projects,
            people = result.people,
            assets = result.assets,
            findings = result.findings,
            events = result.events,
            "ingested batch"
        );
    }
    Ok(result)
}
