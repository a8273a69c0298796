use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;

/// A typed field value, normalized by the validator or read back from storage.
///
/// Serialized adjacently tagged (`{"type": "text", "value": ...}`) so that a
/// text value shaped like a timestamp or a number keeps its variant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Text(String),
    Links(Vec<i64>),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_links(&self) -> Option<&[i64]> {
        match self {
            Self::Links(ids) => Some(ids),
            _ => None,
        }
    }

    /// Untagged JSON form used in audit snapshots.
    #[must_use]
    pub fn to_plain_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => (*b).into(),
            Self::Integer(n) => (*n).into(),
            Self::Timestamp(ts) => ts.to_rfc3339().into(),
            Self::Text(s) => s.as_str().into(),
            Self::Links(ids) => ids.as_slice().into(),
        }
    }
}

/// Field name → value, ordered so that serialized snapshots are stable.
pub type Fields = BTreeMap<String, FieldValue>;

/// A persisted domain record of any kind.
///
/// `id` is assigned by the store on first persistence and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub kind: EntityKind,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Snapshot written into `details_before` / `details_after`.
    ///
    /// Object keys are emitted in sorted order.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("id".into(), self.id.into());
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_plain_json());
        }
        map.insert(
            "created_at".into(),
            self.created_at.to_rfc3339().into(),
        );
        map.insert(
            "updated_at".into(),
            self.updated_at.to_rfc3339().into(),
        );
        serde_json::Value::Object(map)
    }
}
