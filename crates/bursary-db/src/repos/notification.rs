//! Notification repository.
//!
//! Notifications carry a weak reference to the object they describe; rows
//! with no `user_id` are broadcasts visible to every user.

use tracing::error;

use bursary_core::entities::{NewNotification, Notification};

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_i64, get_opt_string, opt_integer, opt_text, parse_datetime, parse_enum,
};
use crate::service::BursaryService;

/// Filter criteria for notification listings.
#[derive(Debug, Default)]
pub struct NotificationFilter {
    /// Recipient; `None` lists every notification.
    pub user_id: Option<i64>,
    pub unread_only: bool,
    pub limit: Option<u32>,
}

fn row_to_notification(row: &libsql::Row) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        id: row.get::<i64>(0)?,
        message: row.get::<String>(1)?,
        notification_type: parse_enum(&row.get::<String>(2)?)?,
        priority: parse_enum(&row.get::<String>(3)?)?,
        read_status: row.get::<i64>(4)? != 0,
        user_id: get_opt_i64(row, 5)?,
        related_object_type: get_opt_string(row, 6)?,
        related_object_id: get_opt_i64(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl BursaryService {
    /// Store a notification.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, DatabaseError> {
        let created_at = self.now();
        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO notification (message, type, priority, read_status, user_id, related_object_type, related_object_id, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7)",
            libsql::params![
                notification.message.as_str(),
                notification.notification_type.as_str(),
                notification.priority.as_str(),
                opt_integer(notification.user_id),
                opt_text(notification.related_object_type.as_deref()),
                opt_integer(notification.related_object_id),
                created_at.to_rfc3339()
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();
        Ok(notification.persisted(id, created_at))
    }

    /// Best-effort notification: failures are logged and dropped.
    pub async fn notify(&self, notification: NewNotification) -> Option<Notification> {
        let notification_type = notification.notification_type;
        match self.create_notification(notification).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                error!(
                    notification_type = notification_type.as_str(),
                    error = %e,
                    "notification dropped"
                );
                None
            }
        }
    }

    /// Mark one notification as read. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the UPDATE fails.
    pub async fn mark_notification_read(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute("UPDATE notification SET read_status = 1 WHERE id = ?1", [id])
            .await?;
        Ok(changed > 0)
    }

    /// Notifications visible to `filter.user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_notifications(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(user_id) = filter.user_id {
            params.push(libsql::Value::Integer(user_id));
            conditions.push(format!("(user_id = ?{} OR user_id IS NULL)", params.len()));
        }
        if filter.unread_only {
            conditions.push("read_status = 0".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, message, type, priority, read_status, user_id, related_object_type, related_object_id, created_at
             FROM notification {where_clause}
             ORDER BY id DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next().await? {
            notifications.push(row_to_notification(&row)?);
        }
        Ok(notifications)
    }

    /// Unread notifications visible to `user_id`, including broadcasts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn unread_notification_count(&self, user_id: i64) -> Result<i64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT count(*) FROM notification
                 WHERE read_status = 0 AND (user_id = ?1 OR user_id IS NULL)",
                [user_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}
