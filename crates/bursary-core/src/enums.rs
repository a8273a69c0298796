//! Entity kinds, actions, notification classes, and request modes.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the value stored in SQL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Domain record kinds that flow through the mutation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Stipend,
    Tag,
    Organization,
    User,
    Bot,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Stipend,
        Self::Tag,
        Self::Organization,
        Self::User,
        Self::Bot,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stipend => "stipend",
            Self::Tag => "tag",
            Self::Organization => "organization",
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Human-facing name with a leading capital, used in flash messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Stipend => "Stipend",
            Self::Tag => "Tag",
            Self::Organization => "Organization",
            Self::User => "User",
            Self::Bot => "Bot",
        }
    }

    /// SQL table backing this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Stipend => "stipends",
            Self::Tag => "tags",
            Self::Organization => "organizations",
            Self::User => "users",
            Self::Bot => "bots",
        }
    }

    /// Listing view a full-page response redirects to.
    #[must_use]
    pub const fn listing_path(self) -> &'static str {
        match self {
            Self::Stipend => "/admin/stipends/",
            Self::Tag => "/admin/tags/",
            Self::Organization => "/admin/organizations/",
            Self::User => "/admin/users/",
            Self::Bot => "/admin/bots/",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                what: "entity type",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MutationAction
// ---------------------------------------------------------------------------

/// Lifecycle transition requested by a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl MutationAction {
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Past-tense verb for success messages ("created", "updated", "deleted").
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }

    /// Audit action written for a completed mutation of this kind.
    #[must_use]
    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Create => AuditAction::Create,
            Self::Update => AuditAction::Update,
            Self::Delete => AuditAction::Delete,
        }
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                what: "action",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Closed set of actions an audit record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Error,
    ValidationError,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Error => "error",
            Self::ValidationError => "validation_error",
        }
    }

    /// Capitalized label used in derived notification messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Error => "Error",
            Self::ValidationError => "Validation_error",
        }
    }

    /// Notification class derived from this action.
    #[must_use]
    pub const fn notification_type(self) -> NotificationType {
        match self {
            Self::Create => NotificationType::CrudCreate,
            Self::Update => NotificationType::CrudUpdate,
            Self::Delete => NotificationType::CrudDelete,
            Self::Error | Self::ValidationError => NotificationType::AuditLog,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NotificationType
// ---------------------------------------------------------------------------

/// Semantic class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    // System and admin actions
    AdminAction,
    System,
    // Audit and logging
    AuditLog,
    CrudAudit,
    // User actions
    UserAction,
    UserCreated,
    UserUpdated,
    UserDeleted,
    PasswordReset,
    // Bot operations
    BotSuccess,
    BotError,
    // CRUD operations
    CrudCreate,
    CrudUpdate,
    CrudDelete,
}

impl NotificationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdminAction => "admin_action",
            Self::System => "system",
            Self::AuditLog => "audit_log",
            Self::CrudAudit => "crud_audit",
            Self::UserAction => "user_action",
            Self::UserCreated => "user_created",
            Self::UserUpdated => "user_updated",
            Self::UserDeleted => "user_deleted",
            Self::PasswordReset => "password_reset",
            Self::BotSuccess => "bot_success",
            Self::BotError => "bot_error",
            Self::CrudCreate => "crud_create",
            Self::CrudUpdate => "crud_update",
            Self::CrudDelete => "crud_delete",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NotificationPriority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl NotificationPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RequestMode
// ---------------------------------------------------------------------------

/// Response shape requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Full page reload.
    #[default]
    Standard,
    /// Partial update of one element of the page.
    Fragment,
}

impl RequestMode {
    /// Header the route layer inspects to select fragment mode.
    pub const FRAGMENT_HEADER: &'static str = "HX-Request";

    /// Select the mode from the value of [`Self::FRAGMENT_HEADER`], if present.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("true") => Self::Fragment,
            _ => Self::Standard,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                assert_eq!(val.as_str(), $expected_str);
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(entity_stipend, EntityKind, EntityKind::Stipend, "stipend");
    test_serde_roundtrip!(
        audit_validation_error,
        AuditAction,
        AuditAction::ValidationError,
        "validation_error"
    );
    test_serde_roundtrip!(
        notification_crud_create,
        NotificationType,
        NotificationType::CrudCreate,
        "crud_create"
    );
    test_serde_roundtrip!(
        notification_bot_error,
        NotificationType,
        NotificationType::BotError,
        "bot_error"
    );
    test_serde_roundtrip!(
        priority_critical,
        NotificationPriority,
        NotificationPriority::Critical,
        "critical"
    );
    test_serde_roundtrip!(mode_fragment, RequestMode, RequestMode::Fragment, "fragment");

    #[test]
    fn entity_kind_parses_from_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("widget".parse::<EntityKind>().is_err());
    }

    #[test]
    fn mutation_actions_map_to_audit_and_notification() {
        assert_eq!(MutationAction::Create.audit_action(), AuditAction::Create);
        assert_eq!(MutationAction::Delete.audit_action(), AuditAction::Delete);
        assert_eq!(
            MutationAction::Update.audit_action().notification_type(),
            NotificationType::CrudUpdate
        );
        assert_eq!(
            AuditAction::ValidationError.notification_type(),
            NotificationType::AuditLog
        );
    }

    #[test]
    fn default_priority_is_medium() {
        assert_eq!(NotificationPriority::default(), NotificationPriority::Medium);
    }

    #[test]
    fn request_mode_from_header() {
        assert_eq!(RequestMode::from_header(Some("true")), RequestMode::Fragment);
        assert_eq!(RequestMode::from_header(Some("TRUE ")), RequestMode::Fragment);
        assert_eq!(RequestMode::from_header(Some("false")), RequestMode::Standard);
        assert_eq!(RequestMode::from_header(None), RequestMode::Standard);
    }
}
