use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::audit::normalize_actor;
use crate::enums::{NotificationPriority, NotificationType};

/// A user-facing message derived from an audit event or system condition.
///
/// `related_object_type` / `related_object_id` are a weak reference: deleting
/// the referenced entity leaves the notification untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub read_status: bool,
    /// `None` broadcasts to every user.
    pub user_id: Option<i64>,
    pub related_object_type: Option<String>,
    pub related_object_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Notification content before persistence. Always starts unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub user_id: Option<i64>,
    pub related_object_type: Option<String>,
    pub related_object_id: Option<i64>,
}

impl NewNotification {
    #[must_use]
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            notification_type,
            priority: NotificationPriority::default(),
            user_id: None,
            related_object_type: None,
            related_object_id: None,
        }
    }

    #[must_use]
    pub const fn priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn for_user(mut self, actor: Option<i64>) -> Self {
        self.user_id = normalize_actor(actor);
        self
    }

    #[must_use]
    pub fn related(mut self, object_type: impl Into<String>, object_id: Option<i64>) -> Self {
        self.related_object_type = Some(object_type.into());
        self.related_object_id = object_id;
        self
    }

    /// Attach the row id and creation time assigned by the store.
    #[must_use]
    pub fn persisted(self, id: i64, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            message: self.message,
            notification_type: self.notification_type,
            priority: self.priority,
            read_status: false,
            user_id: self.user_id,
            related_object_type: self.related_object_type,
            related_object_id: self.related_object_id,
            created_at,
        }
    }
}
