//! Cross-cutting error types for Bursary.
//!
//! Storage errors (`DatabaseError`, `AuditError`) live in `bursary-db`.
//! Configuration errors live in `bursary-config`.

use thiserror::Error;

/// Errors that can be raised by any Bursary crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string did not name any variant of a closed enum.
    #[error("Unknown {what}: '{value}'")]
    UnknownVariant { what: &'static str, value: String },

    /// A record was built without one of its mandatory attributes.
    #[error("Missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
