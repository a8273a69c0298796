//! Database error types for bursary-db.

use bursary_config::ConfigError;
use bursary_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be mapped.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Settings could not be derived from configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether the store rejected the statement because of a table constraint
    /// (UNIQUE, NOT NULL, CHECK, FOREIGN KEY).
    ///
    /// libSQL only exposes these through the error text.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::LibSql(e) => e.to_string().contains("constraint failed"),
            _ => false,
        }
    }
}

/// Errors raised while writing an audit record.
///
/// Never crosses the orchestrator boundary: the orchestrator logs it and
/// converts it into a system notification.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The record was missing its action or object type.
    #[error("Invalid audit record: {0}")]
    InvalidRecord(#[from] CoreError),

    /// The audit row could not be stored.
    #[error("Audit store failed: {0}")]
    Store(#[from] DatabaseError),
}
