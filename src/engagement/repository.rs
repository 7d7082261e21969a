//! Repository implementations for engagement data access
//!
//! One repository per entity, all sharing the serialized [`EngagementDb`]
//! connection. Writes validate required fields and owning-project existence
//! before touching the database; reads decode strictly - a stored enum
//! string outside its domain is a `DataIntegrity` error, never a silent
//! default. Queries list in insertion order (rowid) so table views are
//! deterministic.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::db::EngagementDb;
use super::error::{EngagementError, Result};
use super::models::{
    ActivityEvent, Asset, AssetKind, ConfidenceTier, EntityKind, EntityRef, Finding,
    FindingStatus, Person, Project, ProjectStatus, Severity,
};

// ============================================
// SHARED HELPERS
// ============================================

/// Build a strict-decode failure for column `idx`.
fn bad_column(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

fn vec_to_json<T: serde::Serialize>(items: &[T]) -> Result<Option<String>> {
    if items.is_empty() {
        Ok(None)
    } else {
        serde_json::to_string(items)
            .map(Some)
            .map_err(|e| EngagementError::Validation(format!("unserializable field: {e}")))
    }
}

fn json_to_vec<T: serde::de::DeserializeOwned>(
    idx: usize,
    json: Option<String>,
) -> rusqlite::Result<Vec<T>> {
    match json {
        None => Ok(Vec::new()),
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| bad_column(idx, format!("malformed json column: {e}"))),
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(EngagementError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Owning project must exist before an owned entity may be written.
fn require_project(conn: &Connection, project_id: &str) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM projects WHERE id = ?1",
            params![project_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        Ok(())
    } else {
        Err(EngagementError::Validation(format!(
            "owning project does not exist: {project_id}"
        )))
    }
}

/// Map a uniqueness violation on insert to a typed conflict.
fn map_insert_err(kind: &'static str, id: &str, e: rusqlite::Error) -> EngagementError {
    if EngagementError::is_constraint_violation(&e) {
        EngagementError::Conflict {
            kind,
            id: id.to_string(),
        }
    } else {
        e.into()
    }
}

pub(crate) fn insert_project(conn: &Connection, project: &Project) -> Result<()> {
    validate_project(project)?;
    conn.execute(
        r#"
        INSERT INTO projects (id, name, target, scope_json, status, nda_flag, team_json, created_at, last_activity_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            project.id,
            project.name,
            project.target,
            vec_to_json(&project.scope)?,
            project.status.as_str(),
            project.nda_flag as i64,
            vec_to_json(&project.team)?,
            project.created_at,
            project.last_activity_at,
        ],
    )
    .map_err(|e| map_insert_err("project", &project.id, e))?;
    debug!(project = %project.id, "project inserted");
    Ok(())
}

pub(crate) fn delete_project(conn: &Connection, id: &str) -> Result<()> {
    let affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(EngagementError::NotFound {
            kind: "project",
            id: id.to_string(),
        });
    }
    debug!(project = %id, "project deleted (cascade)");
    Ok(())
}

pub(crate) fn set_project_scope(
    conn: &Connection,
    project_id: &str,
    scope: &[String],
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE projects SET scope_json = ?2, last_activity_at = ?3 WHERE id = ?1",
        params![project_id, vec_to_json(scope)?, now],
    )?;
    Ok(())
}

fn validate_project(project: &Project) -> Result<()> {
    require("project id", &project.id)?;
    require("project name", &project.name)?;
    require("project target", &project.target)?;
    for (i, member) in project.team.iter().enumerate() {
        if project.team[..i].contains(member) {
            return Err(EngagementError::Validation(format!(
                "duplicate team member: {member}"
            )));
        }
    }
    Ok(())
}

pub(crate) fn touch_project(conn: &Connection, project_id: &str, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE projects SET last_activity_at = ?2 WHERE id = ?1",
        params![project_id, now],
    )?;
    Ok(())
}

pub(crate) fn append_event(conn: &Connection, event: &ActivityEvent) -> Result<()> {
    require("event actor", &event.actor)?;
    require("event description", &event.description)?;
    conn.execute(
        r#"
        INSERT INTO activity_events (id, actor, description, timestamp, entity_kind, entity_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            event.id,
            event.actor,
            event.description,
            event.timestamp,
            event.entity.as_ref().map(|r| r.kind.as_str()),
            event.entity.as_ref().map(|r| r.id.as_str()),
        ],
    )
    .map_err(|e| map_insert_err("activity event", &event.id, e))?;
    Ok(())
}

// ============================================
// ROW DECODERS (strict)
// ============================================

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let status: String = row.get(4)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        target: row.get(2)?,
        scope: json_to_vec(3, row.get::<_, Option<String>>(3)?)?,
        status: ProjectStatus::from_str(&status)
            .ok_or_else(|| bad_column(4, format!("unknown project status: {status}")))?,
        nda_flag: row.get::<_, i64>(5)? != 0,
        team: json_to_vec(6, row.get::<_, Option<String>>(6)?)?,
        created_at: row.get(7)?,
        last_activity_at: row.get(8)?,
    })
}

fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
    let confidence: String = row.get(8)?;
    Ok(Person {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        email: row.get(4)?,
        source: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        social_profiles: json_to_vec(6, row.get::<_, Option<String>>(6)?)?,
        leaked_data: json_to_vec(7, row.get::<_, Option<String>>(7)?)?,
        confidence: ConfidenceTier::from_str(&confidence)
            .ok_or_else(|| bad_column(8, format!("unknown confidence tier: {confidence}")))?,
        tags: json_to_vec(9, row.get::<_, Option<String>>(9)?)?,
        discovered_at: row.get(10)?,
    })
}

fn row_to_asset(row: &Row) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        project_id: row.get(1)?,
        kind: AssetKind::from(row.get::<_, String>(2)?),
        value: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_finding(row: &Row) -> rusqlite::Result<Finding> {
    let severity: String = row.get(3)?;
    let status: String = row.get(7)?;
    Ok(Finding {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        severity: Severity::from_str(&severity)
            .ok_or_else(|| bad_column(3, format!("unknown severity: {severity}")))?,
        asset: row.get(4)?,
        cve: row.get(5)?,
        cvss: row.get(6)?,
        status: FindingStatus::from_str(&status)
            .ok_or_else(|| bad_column(7, format!("unknown finding status: {status}")))?,
        assigned_to: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<ActivityEvent> {
    let entity = match (
        row.get::<_, Option<String>>(4)?,
        row.get::<_, Option<String>>(5)?,
    ) {
        (Some(kind), Some(id)) => Some(EntityRef {
            kind: EntityKind::from_str(&kind)
                .ok_or_else(|| bad_column(4, format!("unknown entity kind: {kind}")))?,
            id,
        }),
        _ => None,
    };
    Ok(ActivityEvent {
        id: row.get(0)?,
        actor: row.get(1)?,
        description: row.get(2)?,
        timestamp: row.get(3)?,
        entity,
    })
}

const PROJECT_COLS: &str =
    "id, name, target, scope_json, status, nda_flag, team_json, created_at, last_activity_at";
const PERSON_COLS: &str = "id, project_id, name, title, email, source, social_profiles_json, \
     leaked_data_json, confidence, tags_json, discovered_at";
const ASSET_COLS: &str = "id, project_id, kind, value, created_at";
const FINDING_COLS: &str =
    "id, project_id, title, severity, asset, cve, cvss, status, assigned_to, created_at, updated_at";
const EVENT_COLS: &str = "id, actor, description, timestamp, entity_kind, entity_id";

pub(crate) fn fetch_project(conn: &Connection, id: &str) -> Result<Project> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLS} FROM projects WHERE id = ?1"),
        params![id],
        row_to_project,
    )
    .optional()?
    .ok_or_else(|| EngagementError::NotFound {
        kind: "project",
        id: id.to_string(),
    })
}

pub(crate) fn fetch_person(conn: &Connection, project_id: &str, id: &str) -> Result<Person> {
    conn.query_row(
        &format!("SELECT {PERSON_COLS} FROM people WHERE project_id = ?1 AND id = ?2"),
        params![project_id, id],
        row_to_person,
    )
    .optional()?
    .ok_or_else(|| EngagementError::NotFound {
        kind: "person",
        id: format!("{project_id}/{id}"),
    })
}

pub(crate) fn fetch_finding(conn: &Connection, id: &str) -> Result<Finding> {
    conn.query_row(
        &format!("SELECT {FINDING_COLS} FROM findings WHERE id = ?1"),
        params![id],
        row_to_finding,
    )
    .optional()?
    .ok_or_else(|| EngagementError::NotFound {
        kind: "finding",
        id: id.to_string(),
    })
}

/// Persist the mutable person fields (tags and confidence).
pub(crate) fn persist_person_fields(conn: &Connection, person: &Person) -> Result<()> {
    conn.execute(
        "UPDATE people SET tags_json = ?3, confidence = ?4 WHERE project_id = ?1 AND id = ?2",
        params![
            person.project_id,
            person.id,
            vec_to_json(&person.tags)?,
            person.confidence.as_str(),
        ],
    )?;
    Ok(())
}

// ============================================
// PROJECT REPOSITORY
// ============================================

/// Repository for Project CRUD operations
pub struct ProjectRepository {
    db: EngagementDb,
}

impl ProjectRepository {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    /// Insert a new project; duplicate ids are a conflict
    pub fn insert(&self, project: &Project) -> Result<()> {
        insert_project(&self.db.conn(), project)
    }

    /// Insert or replace by id. `ON CONFLICT DO UPDATE` keeps the rowid, so
    /// replacing never disturbs insertion order.
    pub fn upsert(&self, project: &Project) -> Result<()> {
        validate_project(project)?;
        let conn = self.db.conn();
        conn.execute(
            r#"
            INSERT INTO projects (id, name, target, scope_json, status, nda_flag, team_json, created_at, last_activity_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                target = excluded.target,
                scope_json = excluded.scope_json,
                status = excluded.status,
                nda_flag = excluded.nda_flag,
                team_json = excluded.team_json,
                last_activity_at = excluded.last_activity_at
            "#,
            params![
                project.id,
                project.name,
                project.target,
                vec_to_json(&project.scope)?,
                project.status.as_str(),
                project.nda_flag as i64,
                vec_to_json(&project.team)?,
                project.created_at,
                project.last_activity_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Project> {
        fetch_project(&self.db.conn(), id)
    }

    /// List all projects in insertion order
    pub fn list(&self) -> Result<Vec<Project>> {
        self.query(|_| true)
    }

    /// Matching projects in insertion order; restart by calling again.
    /// Each call sees one consistent snapshot.
    pub fn query<P>(&self, mut predicate: P) -> Result<Vec<Project>>
    where
        P: FnMut(&Project) -> bool,
    {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {PROJECT_COLS} FROM projects ORDER BY rowid"))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], row_to_project)? {
            let project = row?;
            if predicate(&project) {
                out.push(project);
            }
        }
        Ok(out)
    }

    /// Delete a project; owned people/assets/findings cascade
    pub fn delete(&self, id: &str) -> Result<()> {
        delete_project(&self.db.conn(), id)
    }
}

// ============================================
// PERSON REPOSITORY
// ============================================

/// Repository for Person CRUD operations
pub struct PersonRepository {
    db: EngagementDb,
}

impl PersonRepository {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    fn validate(conn: &Connection, person: &Person) -> Result<()> {
        require("person id", &person.id)?;
        require("person name", &person.name)?;
        require_project(conn, &person.project_id)
    }

    pub fn insert(&self, person: &Person) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, person)?;
        let profiles_json = vec_to_json(&person.social_profiles)?;
        let leaks_json = vec_to_json(&person.leaked_data)?;
        let tags_json = vec_to_json(&person.tags)?;
        conn.execute(
            &format!(
                "INSERT INTO people ({PERSON_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                person.id,
                person.project_id,
                person.name,
                person.title,
                person.email,
                person.source,
                profiles_json,
                leaks_json,
                person.confidence.as_str(),
                tags_json,
                person.discovered_at,
            ],
        )
        .map_err(|e| map_insert_err("person", &person.id, e))?;
        Ok(())
    }

    pub fn upsert(&self, person: &Person) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, person)?;
        let profiles_json = vec_to_json(&person.social_profiles)?;
        let leaks_json = vec_to_json(&person.leaked_data)?;
        let tags_json = vec_to_json(&person.tags)?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO people ({PERSON_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(project_id, id) DO UPDATE SET
                    name = excluded.name,
                    title = excluded.title,
                    email = excluded.email,
                    source = excluded.source,
                    social_profiles_json = excluded.social_profiles_json,
                    leaked_data_json = excluded.leaked_data_json,
                    confidence = excluded.confidence,
                    tags_json = excluded.tags_json
                "#
            ),
            params![
                person.id,
                person.project_id,
                person.name,
                person.title,
                person.email,
                person.source,
                profiles_json,
                leaks_json,
                person.confidence.as_str(),
                tags_json,
                person.discovered_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, project_id: &str, id: &str) -> Result<Person> {
        fetch_person(&self.db.conn(), project_id, id)
    }

    /// People in a project, in discovery (insertion) order
    pub fn list_by_project(&self, project_id: &str) -> Result<Vec<Person>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERSON_COLS} FROM people WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map(params![project_id], row_to_person)? {
            out.push(row?);
        }
        Ok(out)
    }

    /// Matching people across all projects, in insertion order
    pub fn query<P>(&self, mut predicate: P) -> Result<Vec<Person>>
    where
        P: FnMut(&Person) -> bool,
    {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!("SELECT {PERSON_COLS} FROM people ORDER BY rowid"))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], row_to_person)? {
            let person = row?;
            if predicate(&person) {
                out.push(person);
            }
        }
        Ok(out)
    }
}

// ============================================
// ASSET REPOSITORY
// ============================================

/// Repository for Asset CRUD operations
pub struct AssetRepository {
    db: EngagementDb,
}

impl AssetRepository {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    fn validate(conn: &Connection, asset: &Asset) -> Result<()> {
        require("asset id", &asset.id)?;
        require("asset value", &asset.value)?;
        require_project(conn, &asset.project_id)
    }

    pub fn insert(&self, asset: &Asset) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, asset)?;
        conn.execute(
            &format!("INSERT INTO assets ({ASSET_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                asset.id,
                asset.project_id,
                asset.kind.as_str(),
                asset.value,
                asset.created_at,
            ],
        )
        .map_err(|e| map_insert_err("asset", &asset.id, e))?;
        Ok(())
    }

    pub fn upsert(&self, asset: &Asset) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, asset)?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO assets ({ASSET_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    project_id = excluded.project_id,
                    kind = excluded.kind,
                    value = excluded.value
                "#
            ),
            params![
                asset.id,
                asset.project_id,
                asset.kind.as_str(),
                asset.value,
                asset.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Asset> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {ASSET_COLS} FROM assets WHERE id = ?1"),
                params![id],
                row_to_asset,
            )
            .optional()?
            .ok_or_else(|| EngagementError::NotFound {
                kind: "asset",
                id: id.to_string(),
            })
    }

    /// Assets in a project, in discovery (insertion) order
    pub fn list_by_project(&self, project_id: &str) -> Result<Vec<Asset>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSET_COLS} FROM assets WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map(params![project_id], row_to_asset)? {
            out.push(row?);
        }
        Ok(out)
    }

    /// Matching assets across all projects, in insertion order
    pub fn query<P>(&self, mut predicate: P) -> Result<Vec<Asset>>
    where
        P: FnMut(&Asset) -> bool,
    {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!("SELECT {ASSET_COLS} FROM assets ORDER BY rowid"))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], row_to_asset)? {
            let asset = row?;
            if predicate(&asset) {
                out.push(asset);
            }
        }
        Ok(out)
    }
}

// ============================================
// FINDING REPOSITORY
// ============================================

/// Repository for Finding CRUD operations.
///
/// Status changes do not happen here - they go through the triage state
/// machine so the audit event commits atomically with the mutation.
pub struct FindingRepository {
    db: EngagementDb,
}

impl FindingRepository {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    fn validate(conn: &Connection, finding: &Finding) -> Result<()> {
        require("finding id", &finding.id)?;
        require("finding title", &finding.title)?;
        require("finding asset", &finding.asset)?;
        if !(0.0..=10.0).contains(&finding.cvss) {
            return Err(EngagementError::Validation(format!(
                "cvss out of range: {}",
                finding.cvss
            )));
        }
        require_project(conn, &finding.project_id)
    }

    pub fn insert(&self, finding: &Finding) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, finding)?;
        conn.execute(
            &format!(
                "INSERT INTO findings ({FINDING_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                finding.id,
                finding.project_id,
                finding.title,
                finding.severity.as_str(),
                finding.asset,
                finding.cve,
                finding.cvss,
                finding.status.as_str(),
                finding.assigned_to,
                finding.created_at,
                finding.updated_at,
            ],
        )
        .map_err(|e| map_insert_err("finding", &finding.id, e))?;
        Ok(())
    }

    pub fn upsert(&self, finding: &Finding) -> Result<()> {
        let conn = self.db.conn();
        Self::validate(&conn, finding)?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO findings ({FINDING_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(id) DO UPDATE SET
                    project_id = excluded.project_id,
                    title = excluded.title,
                    severity = excluded.severity,
                    asset = excluded.asset,
                    cve = excluded.cve,
                    cvss = excluded.cvss,
                    status = excluded.status,
                    assigned_to = excluded.assigned_to,
                    updated_at = excluded.updated_at
                "#
            ),
            params![
                finding.id,
                finding.project_id,
                finding.title,
                finding.severity.as_str(),
                finding.asset,
                finding.cve,
                finding.cvss,
                finding.status.as_str(),
                finding.assigned_to,
                finding.created_at,
                finding.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Finding> {
        fetch_finding(&self.db.conn(), id)
    }

    /// Findings in a project, in insertion order (board determinism)
    pub fn list_by_project(&self, project_id: &str) -> Result<Vec<Finding>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FINDING_COLS} FROM findings WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map(params![project_id], row_to_finding)? {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn list_by_status(&self, status: FindingStatus) -> Result<Vec<Finding>> {
        self.query(|f| f.status == status)
    }

    /// Matching findings across all projects, in insertion order
    pub fn query<P>(&self, mut predicate: P) -> Result<Vec<Finding>>
    where
        P: FnMut(&Finding) -> bool,
    {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {FINDING_COLS} FROM findings ORDER BY rowid"))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], row_to_finding)? {
            let finding = row?;
            if predicate(&finding) {
                out.push(finding);
            }
        }
        Ok(out)
    }
}

// ============================================
// ACTIVITY REPOSITORY (append-only)
// ============================================

/// Repository for the activity feed. Append and read only.
pub struct ActivityRepository {
    db: EngagementDb,
}

impl ActivityRepository {
    pub fn new(db: EngagementDb) -> Self {
        Self { db }
    }

    /// Append an event to the feed
    pub fn append(&self, event: &ActivityEvent) -> Result<()> {
        append_event(&self.db.conn(), event)
    }

    /// Most recent events first, for the dashboard feed
    pub fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM activity_events ORDER BY timestamp DESC, rowid DESC LIMIT ?1"
        ))?;
        let limit: i64 = limit.try_into().unwrap_or(i64::MAX);
        let mut out = Vec::new();
        for row in stmt.query_map(params![limit], row_to_event)? {
            out.push(row?);
        }
        Ok(out)
    }

    /// All events oldest first, for timeline bucketing
    pub fn list_all(&self) -> Result<Vec<ActivityEvent>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM activity_events ORDER BY timestamp ASC, rowid ASC"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], row_to_event)? {
            out.push(row?);
        }
        Ok(out)
    }

    /// Events recorded against one entity, oldest first
    pub fn for_entity(&self, entity: &EntityRef) -> Result<Vec<ActivityEvent>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM activity_events \
             WHERE entity_kind = ?1 AND entity_id = ?2 ORDER BY timestamp ASC, rowid ASC"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map(params![entity.kind.as_str(), entity.id], row_to_event)? {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.conn();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM activity_events", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}
