//! Row-to-value conversion helpers.
//!
//! Handles the dual datetime format issue (`SQLite`'s `datetime('now')` vs
//! Rust's `to_rfc3339()`) and maps typed field values onto SQL values.

use chrono::{DateTime, Utc};

use bursary_core::entities::FieldValue;
use bursary_core::schema::FieldKind;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all bursary-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a nullable INTEGER column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_i64(row: &libsql::Row, idx: i32) -> Result<Option<i64>, DatabaseError> {
    Ok(row.get::<Option<i64>>(idx)?)
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// SQL value for an optional integer.
#[must_use]
pub fn opt_integer(value: Option<i64>) -> libsql::Value {
    value.map_or(libsql::Value::Null, libsql::Value::Integer)
}

/// SQL value for an optional string.
#[must_use]
pub fn opt_text(value: Option<&str>) -> libsql::Value {
    value.map_or(libsql::Value::Null, |s| libsql::Value::Text(s.to_string()))
}

/// Map a column field value onto its stored representation.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` for link lists, which live in
/// association tables rather than columns.
pub fn field_to_sql(value: &FieldValue) -> Result<libsql::Value, DatabaseError> {
    Ok(match value {
        FieldValue::Null => libsql::Value::Null,
        FieldValue::Boolean(b) => libsql::Value::Integer(i64::from(*b)),
        FieldValue::Integer(i) => libsql::Value::Integer(*i),
        FieldValue::Timestamp(ts) => libsql::Value::Text(ts.to_rfc3339()),
        FieldValue::Text(s) => libsql::Value::Text(s.clone()),
        FieldValue::Links(_) => {
            return Err(DatabaseError::InvalidState(
                "link lists are not stored as columns".into(),
            ));
        }
    })
}

/// Read a stored column back into a typed field value.
///
/// # Errors
///
/// Returns `DatabaseError::Query` when the stored type does not match `kind`.
pub fn sql_to_field(kind: FieldKind, value: libsql::Value) -> Result<FieldValue, DatabaseError> {
    match (kind, value) {
        (_, libsql::Value::Null) => Ok(FieldValue::Null),
        (FieldKind::Boolean, libsql::Value::Integer(i)) => Ok(FieldValue::Boolean(i != 0)),
        (FieldKind::DateTime { .. }, libsql::Value::Text(s)) => {
            Ok(FieldValue::Timestamp(parse_datetime(&s)?))
        }
        (
            FieldKind::Text { .. } | FieldKind::LongText | FieldKind::Url | FieldKind::Email,
            libsql::Value::Text(s),
        ) => Ok(FieldValue::Text(s)),
        (_, libsql::Value::Integer(i)) => Ok(FieldValue::Integer(i)),
        (kind, other) => Err(DatabaseError::Query(format!(
            "Unexpected stored value {other:?} for field kind {kind:?}"
        ))),
    }
}
