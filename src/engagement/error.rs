//! Error taxonomy for the engagement store and triage engine

use super::models::FindingStatus;

/// Errors reported by store, triage, and aggregation operations.
///
/// All variants are local, recoverable conditions: a failed mutation leaves
/// no partial state behind (entity and audit event commit together or not
/// at all).
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    /// Malformed or incomplete entity on write
    #[error("validation failed: {0}")]
    Validation(String),

    /// Lookup by an unknown identifier
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate identifier on insert of a new entity
    #[error("{kind} already exists: {id}")]
    Conflict { kind: &'static str, id: String },

    /// Triage edge not in the allowed set
    #[error("illegal triage transition: {from} -> {to}")]
    InvalidTransition {
        from: FindingStatus,
        to: FindingStatus,
    },

    /// Stored value outside its defined domain (unknown status/severity/...)
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, EngagementError>;

impl From<rusqlite::Error> for EngagementError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            // Strict row decoding reports unknown enum strings through this
            // variant; surface them as integrity failures, not driver errors.
            rusqlite::Error::FromSqlConversionFailure(_, _, err) => {
                EngagementError::DataIntegrity(err.to_string())
            }
            other => EngagementError::Sqlite(other),
        }
    }
}

impl EngagementError {
    /// True when the underlying SQLite error is a uniqueness violation.
    pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(info, _)
                if info.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
