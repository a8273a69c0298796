use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;
use crate::errors::CoreError;

/// An append-only audit record of one completed lifecycle transition.
///
/// There is no update or delete path for persisted records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: i64,
    /// `None` denotes the system.
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub object_type: String,
    /// `None` for failed creations.
    pub object_id: Option<i64>,
    pub details: String,
    pub details_before: Option<serde_json::Value>,
    pub details_after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A validated audit record that has not been persisted yet.
///
/// Only constructible through [`NewAuditRecord::builder`], which rejects
/// records without an action or object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditRecord {
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub object_type: String,
    pub object_id: Option<i64>,
    pub details: String,
    pub details_before: Option<serde_json::Value>,
    pub details_after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewAuditRecord {
    #[must_use]
    pub fn builder() -> AuditRecordBuilder {
        AuditRecordBuilder::default()
    }

    /// Text stored in the `details_before` column.
    #[must_use]
    pub fn before_text(&self) -> Option<String> {
        self.details_before.as_ref().map(ToString::to_string)
    }

    /// Text stored in the `details_after` column.
    #[must_use]
    pub fn after_text(&self) -> Option<String> {
        self.details_after.as_ref().map(ToString::to_string)
    }

    /// Attach the row id assigned by the store.
    #[must_use]
    pub fn persisted(self, id: i64) -> AuditRecord {
        AuditRecord {
            id,
            user_id: self.user_id,
            action: self.action,
            object_type: self.object_type,
            object_id: self.object_id,
            details: self.details,
            details_before: self.details_before,
            details_after: self.details_after,
            ip_address: self.ip_address,
            timestamp: self.timestamp,
        }
    }
}

/// Normalize an actor identity: `0` and `None` both mean the system.
#[must_use]
pub fn normalize_actor(actor: Option<i64>) -> Option<i64> {
    actor.filter(|id| *id != 0)
}

#[derive(Debug, Clone, Default)]
pub struct AuditRecordBuilder {
    user_id: Option<i64>,
    action: Option<AuditAction>,
    object_type: Option<String>,
    object_id: Option<i64>,
    details: String,
    details_before: Option<serde_json::Value>,
    details_after: Option<serde_json::Value>,
    ip_address: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl AuditRecordBuilder {
    #[must_use]
    pub fn actor(mut self, actor: Option<i64>) -> Self {
        self.user_id = normalize_actor(actor);
        self
    }

    #[must_use]
    pub const fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn target(mut self, object_type: impl Into<String>, object_id: Option<i64>) -> Self {
        self.object_type = Some(object_type.into());
        self.object_id = object_id;
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    #[must_use]
    pub fn before(mut self, snapshot: Option<serde_json::Value>) -> Self {
        self.details_before = snapshot;
        self
    }

    #[must_use]
    pub fn after(mut self, snapshot: Option<serde_json::Value>) -> Self {
        self.details_after = snapshot;
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: Option<&str>) -> Self {
        self.ip_address = ip.map(String::from);
        self
    }

    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Finish the record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingAttribute` if the action or object type is
    /// missing, and `CoreError::Validation` if a snapshot is attached to an
    /// action that does not carry one (`before` is for update/delete, `after`
    /// for create/update).
    pub fn build(self) -> Result<NewAuditRecord, CoreError> {
        let action = self.action.ok_or(CoreError::MissingAttribute("action"))?;
        let object_type = self
            .object_type
            .filter(|t| !t.trim().is_empty())
            .ok_or(CoreError::MissingAttribute("object_type"))?;

        if self.details_before.is_some()
            && !matches!(action, AuditAction::Update | AuditAction::Delete)
        {
            return Err(CoreError::Validation(format!(
                "details_before is not recorded for '{action}'"
            )));
        }
        if self.details_after.is_some()
            && !matches!(action, AuditAction::Create | AuditAction::Update)
        {
            return Err(CoreError::Validation(format!(
                "details_after is not recorded for '{action}'"
            )));
        }

        Ok(NewAuditRecord {
            user_id: self.user_id,
            action,
            object_type,
            object_id: self.object_id,
            details: self.details,
            details_before: self.details_before,
            details_after: self.details_after,
            ip_address: self.ip_address,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}
