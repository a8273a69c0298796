//! The orchestrator's return value.
//!
//! Route handlers inspect nothing else: the outcome kind, the affected entity,
//! and the error detail decide what the client sees.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::Entity;
use crate::enums::{EntityKind, MutationAction};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    ValidationError,
    NotFound,
    PersistenceError,
}

impl OutcomeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::PersistenceError => "persistence_error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeReport {
    pub action: MutationAction,
    pub entity_kind: EntityKind,
    pub kind: OutcomeKind,
    /// The created or updated entity, or the entity as it was before deletion.
    pub entity: Option<Entity>,
    /// Field-level errors; empty unless `kind` is `validation_error`.
    pub errors: ValidationErrors,
    /// Internal cause of a failure. Logged, never rendered to end users.
    pub detail: Option<String>,
    /// Id of the audit record written for this mutation, if any.
    pub audit_id: Option<i64>,
    /// Secondary problems that did not affect the outcome (audit or notifier failures).
    pub warnings: Vec<String>,
}

impl OutcomeReport {
    fn base(action: MutationAction, entity_kind: EntityKind, kind: OutcomeKind) -> Self {
        Self {
            action,
            entity_kind,
            kind,
            entity: None,
            errors: ValidationErrors::new(),
            detail: None,
            audit_id: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn success(action: MutationAction, entity: Entity) -> Self {
        Self {
            entity: Some(entity.clone()),
            ..Self::base(action, entity.kind, OutcomeKind::Success)
        }
    }

    #[must_use]
    pub fn validation_error(
        action: MutationAction,
        entity_kind: EntityKind,
        errors: ValidationErrors,
    ) -> Self {
        Self {
            errors,
            ..Self::base(action, entity_kind, OutcomeKind::ValidationError)
        }
    }

    #[must_use]
    pub fn not_found(action: MutationAction, entity_kind: EntityKind, id: i64) -> Self {
        Self {
            detail: Some(format!("{entity_kind} {id} does not exist")),
            ..Self::base(action, entity_kind, OutcomeKind::NotFound)
        }
    }

    #[must_use]
    pub fn persistence_error(
        action: MutationAction,
        entity_kind: EntityKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            detail: Some(cause.into()),
            ..Self::base(action, entity_kind, OutcomeKind::PersistenceError)
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Success)
    }

    #[must_use]
    pub fn entity_id(&self) -> Option<i64> {
        self.entity.as_ref().map(|e| e.id)
    }
}
