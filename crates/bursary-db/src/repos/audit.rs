//! Audit trail repository.
//!
//! Append-only records of completed lifecycle transitions. Recording an
//! audit entry notifies the acting user; querying is read-only.

use tracing::debug;

use bursary_core::entities::{AuditRecord, AuditRecordBuilder, NewAuditRecord, NewNotification};
use bursary_core::enums::AuditAction;

use crate::error::{AuditError, DatabaseError};
use crate::helpers::{
    get_opt_i64, get_opt_string, opt_integer, opt_text, parse_datetime, parse_enum,
    parse_optional_json,
};
use crate::service::BursaryService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub object_type: Option<String>,
    pub object_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub user_id: Option<i64>,
    pub limit: Option<u32>,
}

fn row_to_audit(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    Ok(AuditRecord {
        id: row.get::<i64>(0)?,
        user_id: get_opt_i64(row, 1)?,
        action: parse_enum(&row.get::<String>(2)?)?,
        object_type: row.get::<String>(3)?,
        object_id: get_opt_i64(row, 4)?,
        details: get_opt_string(row, 5)?.unwrap_or_default(),
        details_before: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        details_after: parse_optional_json(get_opt_string(row, 7)?.as_deref())?,
        ip_address: get_opt_string(row, 8)?,
        timestamp: parse_datetime(&row.get::<String>(9)?)?,
    })
}

/// Notification text for a recorded transition.
fn audit_message(record: &AuditRecord) -> String {
    match record.object_id {
        Some(id) => format!(
            "{} operation on {} {id}",
            record.action.label(),
            record.object_type
        ),
        None => format!(
            "{} operation on {}",
            record.action.label(),
            record.object_type
        ),
    }
}

impl BursaryService {
    /// Persist an audit record and notify the acting user.
    ///
    /// The notification is best-effort; only the audit insert can fail this call.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::InvalidRecord` when the action or object type is
    /// missing, or `AuditError::Store` if the INSERT fails.
    pub async fn record_audit(
        &self,
        builder: AuditRecordBuilder,
    ) -> Result<AuditRecord, AuditError> {
        let record = self.insert_audit(builder.build()?).await?;
        debug!(
            id = record.id,
            action = record.action.as_str(),
            entity = record.object_type.as_str(),
            "audit recorded"
        );

        let notification =
            NewNotification::new(record.action.notification_type(), audit_message(&record))
                .for_user(record.user_id)
                .related(record.object_type.clone(), record.object_id);
        self.notify(notification).await;

        Ok(record)
    }

    /// Append a record without notifying anyone.
    pub(crate) async fn insert_audit(
        &self,
        record: NewAuditRecord,
    ) -> Result<AuditRecord, DatabaseError> {
        let conn = self.db().conn();
        conn.execute(
            "INSERT INTO audit_log (user_id, action, object_type, object_id, details, details_before, details_after, ip_address, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            libsql::params![
                opt_integer(record.user_id),
                record.action.as_str(),
                record.object_type.as_str(),
                opt_integer(record.object_id),
                record.details.as_str(),
                opt_text(record.before_text().as_deref()),
                opt_text(record.after_text().as_deref()),
                opt_text(record.ip_address.as_deref()),
                record.timestamp.to_rfc3339()
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();
        Ok(record.persisted(id))
    }

    /// Query audit records with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(
        &self,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref object_type) = filter.object_type {
            params.push(libsql::Value::Text(object_type.clone()));
            conditions.push(format!("object_type = ?{}", params.len()));
        }
        if let Some(object_id) = filter.object_id {
            params.push(libsql::Value::Integer(object_id));
            conditions.push(format!("object_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(user_id) = filter.user_id {
            params.push(libsql::Value::Integer(user_id));
            conditions.push(format!("user_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, user_id, action, object_type, object_id, details, details_before, details_after, ip_address, timestamp
             FROM audit_log {where_clause}
             ORDER BY id DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_audit(&row)?);
        }
        Ok(records)
    }

    /// Total number of audit records.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audit(&self) -> Result<i64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT count(*) FROM audit_log", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}
