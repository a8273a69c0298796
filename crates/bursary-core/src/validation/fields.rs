//! Per-kind payload validation and normalization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::ValidationErrors;
use super::datetime::{DateBounds, DateTimeRule};
use crate::entities::{FieldValue, Fields};
use crate::enums::EntityKind;
use crate::schema::{FieldKind, FieldSpec};

/// Raw form submission: field name → submitted string.
pub type Payload = BTreeMap<String, String>;

const REQUIRED: &str = "This field is required.";
const MAX_URL_LEN: usize = 255;

/// Which fields a submission must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadScope {
    /// Create: every field is considered, absent ones as empty.
    Full,
    /// Update: only fields present in the payload are validated and written.
    Partial,
}

/// Environment the validators run in.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub bounds: DateBounds,
}

/// Validate `payload` against the field table of `kind`.
///
/// Keys that are not fields of `kind` (CSRF tokens, submit buttons, `id`)
/// are ignored.
///
/// # Errors
///
/// Returns every failing field with its reasons.
pub fn validate_payload(
    kind: EntityKind,
    payload: &Payload,
    scope: PayloadScope,
    ctx: &ValidationContext,
) -> Result<Fields, ValidationErrors> {
    let mut fields = Fields::new();
    let mut errors = ValidationErrors::new();

    for spec in kind.fields() {
        let raw = payload.get(spec.name).map(String::as_str);
        if scope == PayloadScope::Partial && raw.is_none() {
            continue;
        }
        match validate_field(spec, raw.unwrap_or_default(), ctx) {
            Ok(value) => {
                fields.insert(spec.name.to_string(), value);
            }
            Err(message) => errors.add(spec.name, message),
        }
    }

    errors.into_result(fields)
}

/// Read the target identity of an update or delete.
///
/// # Errors
///
/// Returns an `id` field error when the value is missing or not a positive integer.
pub fn parse_target_id(payload: &Payload) -> Result<i64, ValidationErrors> {
    let raw = payload.get("id").map(|s| s.trim()).unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationErrors::single("id", REQUIRED));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationErrors::single("id", "Invalid identifier.")),
    }
}

fn validate_field(
    spec: &FieldSpec,
    raw: &str,
    ctx: &ValidationContext,
) -> Result<FieldValue, String> {
    let value = raw.trim();

    match spec.kind {
        FieldKind::Boolean => parse_bool(value),
        FieldKind::Links(_) => parse_links(value),
        FieldKind::DateTime { bounded } => {
            let rule = DateTimeRule {
                optional: !spec.required,
                bounds: bounded.then_some(ctx.bounds),
            };
            rule.check(Some(value), ctx.now, ctx.tz)
                .map(|instant| instant.map_or(FieldValue::Null, FieldValue::Timestamp))
                .map_err(|kind| kind.message(ctx.bounds.horizon_years))
        }
        _ if value.is_empty() => {
            if spec.required {
                Err(REQUIRED.into())
            } else {
                Ok(FieldValue::Null)
            }
        }
        FieldKind::Text { max_len } => {
            if value.chars().count() > max_len {
                Err(format!("Field cannot be longer than {max_len} characters."))
            } else {
                Ok(FieldValue::Text(value.to_string()))
            }
        }
        FieldKind::LongText => Ok(FieldValue::Text(value.to_string())),
        FieldKind::Url => {
            if is_url(value) {
                Ok(FieldValue::Text(value.to_string()))
            } else {
                Err("Invalid URL.".into())
            }
        }
        FieldKind::Email => {
            if is_email(value) {
                Ok(FieldValue::Text(value.to_lowercase()))
            } else {
                Err("Invalid email address.".into())
            }
        }
    }
}

fn parse_bool(value: &str) -> Result<FieldValue, String> {
    match value.to_ascii_lowercase().as_str() {
        "" | "n" | "no" | "false" | "off" | "0" => Ok(FieldValue::Boolean(false)),
        "y" | "yes" | "true" | "on" | "1" => Ok(FieldValue::Boolean(true)),
        _ => Err("Invalid boolean value.".into()),
    }
}

fn parse_links(value: &str) -> Result<FieldValue, String> {
    let mut ids = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) if id > 0 => ids.push(id),
            _ => return Err("Invalid identifier list.".into()),
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(FieldValue::Links(ids))
}

fn is_url(value: &str) -> bool {
    if value.len() > MAX_URL_LEN || value.chars().any(char::is_whitespace) {
        return false;
    }
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    rest.and_then(|r| r.split(['/', '?', '#']).next())
        .is_some_and(|host| !host.is_empty() && !host.starts_with('.') && !host.ends_with('.'))
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'))
}
