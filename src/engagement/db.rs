//! SQLite storage and schema management for engagement data
//!
//! Manages the `~/.redtrack/engagements.db` database with automatic schema
//! migration. Projects own their people, assets, and findings through
//! `ON DELETE CASCADE` foreign keys; activity events keep weak references
//! only, so the feed survives cascade deletes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use super::error::{EngagementError, Result};

/// Database wrapper for engagement data
///
/// Cloning is cheap; all clones share one serialized connection. The mutex
/// serializes writers, and compound mutations run in SQLite transactions,
/// so readers always observe fully-committed state.
#[derive(Clone)]
pub struct EngagementDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl EngagementDb {
    /// Open or create the database at the default location (~/.redtrack/engagements.db)
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_data_dir().join("engagements.db");
        Self::open(&db_path)
    }

    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL for concurrent readers alongside the single writer
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests, ephemeral sessions)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".redtrack")
    }

    /// Get a reference to the connection
    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("engagement DB lock poisoned")
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM rt_schema_version",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        // Future migrations go here
        // if version < 2 { ... }

        let _ = version;

        Ok(())
    }

    /// Delete all engagement data (reset to empty state)
    pub fn reset_all(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            DELETE FROM activity_events;
            DELETE FROM findings;
            DELETE FROM assets;
            DELETE FROM people;
            DELETE FROM projects;
            "#,
        )
        .map_err(EngagementError::from)?;
        Ok(())
    }
}

/// SQL schema for the engagement database
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS rt_schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO rt_schema_version VALUES (1);

-- ============================================
-- PROJECTS (Engagements)
-- ============================================
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,                    -- e.g., "proj-megacorp"
    name TEXT NOT NULL,
    target TEXT NOT NULL,                   -- scope descriptor, e.g., "megacorp.io"
    scope_json TEXT,                        -- ordered in-scope entries
    status TEXT NOT NULL DEFAULT 'active',  -- active, completed
    nda_flag INTEGER NOT NULL DEFAULT 0,
    team_json TEXT,                         -- member identifiers
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
    last_activity_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);
CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);

-- ============================================
-- PEOPLE (Recon intelligence)
-- ============================================
CREATE TABLE IF NOT EXISTS people (
    id TEXT NOT NULL,                       -- unique within project
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    title TEXT,
    email TEXT,
    source TEXT,                            -- discovery provenance
    social_profiles_json TEXT,              -- ordered profile records
    leaked_data_json TEXT,                  -- ordered leak records
    confidence TEXT NOT NULL DEFAULT 'low', -- high, medium, low
    tags_json TEXT,
    discovered_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),

    PRIMARY KEY (project_id, id),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_people_project ON people(project_id);

-- ============================================
-- ASSETS
-- ============================================
CREATE TABLE IF NOT EXISTS assets (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    kind TEXT NOT NULL,                     -- subdomain, ip, service, ...
    value TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),

    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_assets_project ON assets(project_id);

-- ============================================
-- FINDINGS (Triage cards)
-- ============================================
CREATE TABLE IF NOT EXISTS findings (
    id TEXT PRIMARY KEY,                    -- VULN-001, VULN-002, ...
    project_id TEXT NOT NULL,
    title TEXT NOT NULL,
    severity TEXT NOT NULL,                 -- critical, high, medium, low
    asset TEXT NOT NULL,                    -- affected asset reference
    cve TEXT,
    cvss REAL NOT NULL DEFAULT 0.0,
    status TEXT NOT NULL DEFAULT 'to-triage', -- to-triage, confirmed, exploitable, remediated
    assigned_to TEXT,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),

    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_findings_project ON findings(project_id);
CREATE INDEX IF NOT EXISTS idx_findings_status ON findings(status);
CREATE INDEX IF NOT EXISTS idx_findings_severity ON findings(severity);

-- ============================================
-- ACTIVITY EVENTS (append-only audit feed)
-- ============================================
-- Entity refs are weak (no FK): cascade deletes may leave dangling refs.
CREATE TABLE IF NOT EXISTS activity_events (
    id TEXT PRIMARY KEY,
    actor TEXT NOT NULL,
    description TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    entity_kind TEXT,                       -- project, person, asset, finding
    entity_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_activity_timestamp ON activity_events(timestamp);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test_engagements.db");
        let db = EngagementDb::open(&db_path).unwrap();

        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"projects".to_string()));
        assert!(tables.contains(&"people".to_string()));
        assert!(tables.contains(&"assets".to_string()));
        assert!(tables.contains(&"findings".to_string()));
        assert!(tables.contains(&"activity_events".to_string()));
    }

    #[test]
    fn test_reset_all() {
        let db = EngagementDb::open_in_memory().unwrap();

        {
            let conn = db.conn();
            conn.execute(
                "INSERT INTO projects (id, name, target) VALUES ('p1', 'Test', 'test.io')",
                [],
            )
            .unwrap();
        }

        db.reset_all().unwrap();

        let conn = db.conn();
        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM projects", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
