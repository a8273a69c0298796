//! Entity structs for all Bursary records touched by the mutation pipeline.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod audit;
mod entity;
mod notification;

pub use audit::{AuditRecord, AuditRecordBuilder, NewAuditRecord, normalize_actor};
pub use entity::{Entity, FieldValue, Fields};
pub use notification::{NewNotification, Notification};
