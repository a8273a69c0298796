//! Response resolution.
//!
//! Maps an [`OutcomeReport`] and a [`RequestMode`] onto the response shape and
//! status code the route layer renders. Template rendering itself happens
//! outside this crate; the resolver only says *what* to render.
//!
//! ```text
//!              success                      failure
//! standard     302 → listing               200 form (validation)
//!                                          302 → listing (not found)
//!                                          500 form (persistence)
//! fragment     200 fragment (create/update) 400 inline error fragment
//!              204 + client redirect (delete)
//! ```

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Entity;
use crate::enums::{EntityKind, MutationAction, RequestMode};
use crate::outcome::{OutcomeKind, OutcomeReport};
use crate::validation::ValidationErrors;

/// Header carrying the client-side redirect target in fragment mode.
pub const CLIENT_REDIRECT_HEADER: &str = "HX-Redirect";

const GENERIC_ERROR: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlashCategory {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// What the route layer should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResponseBody {
    /// No body (redirects, 204).
    Empty,
    /// Re-render the submission form with field annotations.
    Form { errors: ValidationErrors },
    /// Render the row/element fragment for one entity.
    Fragment { entity: Entity },
    /// Render an inline error element.
    ErrorFragment { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
    pub flash: Option<Flash>,
    /// Secondary warnings (e.g. the audit trail could not be written).
    pub warnings: Vec<Flash>,
}

impl RenderedResponse {
    fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            flash: None,
            warnings: Vec::new(),
        }
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    /// Value of the first header named `name`.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Messages {
    success: String,
    failure: String,
}

/// Flash messages for every (action, kind) pair, built once at startup.
#[derive(Debug, Clone)]
pub struct MessageTable {
    entries: HashMap<(MutationAction, EntityKind), Messages>,
    not_found: HashMap<EntityKind, String>,
}

impl MessageTable {
    #[must_use]
    pub fn build() -> Self {
        let mut entries = HashMap::new();
        let mut not_found = HashMap::new();
        for kind in EntityKind::ALL {
            for action in MutationAction::ALL {
                entries.insert(
                    (action, kind),
                    Messages {
                        success: format!(
                            "{} {} successfully.",
                            kind.display_name(),
                            action.past_tense()
                        ),
                        failure: format!("Failed to {} {}.", action.as_str(), kind.as_str()),
                    },
                );
            }
            not_found.insert(kind, format!("{} not found.", kind.display_name()));
        }
        Self {
            entries,
            not_found,
        }
    }

    #[must_use]
    pub fn success(&self, action: MutationAction, kind: EntityKind) -> &str {
        self.entries
            .get(&(action, kind))
            .map_or("Operation completed successfully.", |m| m.success.as_str())
    }

    #[must_use]
    pub fn failure(&self, action: MutationAction, kind: EntityKind) -> &str {
        self.entries
            .get(&(action, kind))
            .map_or(GENERIC_ERROR, |m| m.failure.as_str())
    }

    #[must_use]
    pub fn not_found(&self, kind: EntityKind) -> &str {
        self.not_found.get(&kind).map_or(GENERIC_ERROR, String::as_str)
    }
}

impl Default for MessageTable {
    fn default() -> Self {
        Self::build()
    }
}

/// Decide the response for `outcome` in `mode`.
#[must_use]
pub fn resolve(
    outcome: &OutcomeReport,
    mode: RequestMode,
    messages: &MessageTable,
) -> RenderedResponse {
    let kind = outcome.entity_kind;
    let action = outcome.action;
    let listing = kind.listing_path();

    let mut response = match (mode, outcome.kind) {
        (RequestMode::Standard, OutcomeKind::Success) => {
            RenderedResponse::new(302, ResponseBody::Empty)
                .header("Location", listing)
                .flash(Flash::new(
                    FlashCategory::Success,
                    messages.success(action, kind),
                ))
        }
        (RequestMode::Standard, OutcomeKind::ValidationError) => RenderedResponse::new(
            200,
            ResponseBody::Form {
                errors: outcome.errors.clone(),
            },
        )
        .flash(Flash::new(FlashCategory::Error, messages.failure(action, kind))),
        (RequestMode::Standard, OutcomeKind::NotFound) => {
            RenderedResponse::new(302, ResponseBody::Empty)
                .header("Location", listing)
                .flash(Flash::new(FlashCategory::Error, messages.not_found(kind)))
        }
        (RequestMode::Standard, OutcomeKind::PersistenceError) => RenderedResponse::new(
            500,
            ResponseBody::Form {
                errors: ValidationErrors::new(),
            },
        )
        .flash(Flash::new(FlashCategory::Error, messages.failure(action, kind))),
        (RequestMode::Fragment, OutcomeKind::Success) => {
            let shaped = match (&outcome.entity, action) {
                (Some(entity), MutationAction::Create | MutationAction::Update) => {
                    RenderedResponse::new(
                        200,
                        ResponseBody::Fragment {
                            entity: entity.clone(),
                        },
                    )
                }
                _ => RenderedResponse::new(204, ResponseBody::Empty)
                    .header(CLIENT_REDIRECT_HEADER, listing),
            };
            shaped.flash(Flash::new(
                FlashCategory::Success,
                messages.success(action, kind),
            ))
        }
        (RequestMode::Fragment, failure) => {
            let message = match failure {
                OutcomeKind::ValidationError if !outcome.errors.is_empty() => {
                    outcome.errors.to_string()
                }
                OutcomeKind::NotFound => messages.not_found(kind).to_string(),
                _ => messages.failure(action, kind).to_string(),
            };
            RenderedResponse::new(400, ResponseBody::ErrorFragment { message })
        }
    };

    response.warnings = outcome
        .warnings
        .iter()
        .map(|w| Flash::new(FlashCategory::Warning, w.clone()))
        .collect();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::entities::{FieldValue, Fields};

    fn tag(id: i64) -> Entity {
        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("name".into(), FieldValue::Text("Research".into()));
        Entity {
            id,
            kind: EntityKind::Tag,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    fn table() -> MessageTable {
        MessageTable::build()
    }

    #[test]
    fn standard_success_redirects_to_listing() {
        let outcome = OutcomeReport::success(MutationAction::Create, tag(1));
        let response = resolve(&outcome, RequestMode::Standard, &table());
        assert_eq!(response.status, 302);
        assert_eq!(response.header_value("location"), Some("/admin/tags/"));
        assert_eq!(response.body, ResponseBody::Empty);
        assert_eq!(
            response.flash.unwrap().message,
            "Tag created successfully."
        );
    }

    #[test]
    fn standard_validation_rerenders_form() {
        let errors = ValidationErrors::single("name", "This field is required.");
        let outcome =
            OutcomeReport::validation_error(MutationAction::Create, EntityKind::Tag, errors.clone());
        let response = resolve(&outcome, RequestMode::Standard, &table());
        assert_eq!(response.status, 200);
        assert_eq!(response.body, ResponseBody::Form { errors });
    }

    #[test]
    fn standard_not_found_redirects_with_notice() {
        let outcome = OutcomeReport::not_found(MutationAction::Delete, EntityKind::Tag, 9999);
        let response = resolve(&outcome, RequestMode::Standard, &table());
        assert_eq!(response.status, 302);
        assert_eq!(response.flash.unwrap().message, "Tag not found.");
    }

    #[test]
    fn standard_persistence_error_hides_cause() {
        let outcome = OutcomeReport::persistence_error(
            MutationAction::Create,
            EntityKind::Tag,
            "UNIQUE constraint failed: tags.name",
        );
        let response = resolve(&outcome, RequestMode::Standard, &table());
        assert_eq!(response.status, 500);
        let flash = response.flash.unwrap();
        assert_eq!(flash.message, "Failed to create tag.");
        assert!(!flash.message.contains("UNIQUE"));
    }

    #[test]
    fn fragment_create_returns_entity_fragment() {
        let outcome = OutcomeReport::success(MutationAction::Update, tag(2));
        let response = resolve(&outcome, RequestMode::Fragment, &table());
        assert_eq!(response.status, 200);
        assert!(matches!(response.body, ResponseBody::Fragment { ref entity } if entity.id == 2));
    }

    #[test]
    fn fragment_delete_is_no_content_with_client_redirect() {
        let outcome = OutcomeReport::success(MutationAction::Delete, tag(2));
        let response = resolve(&outcome, RequestMode::Fragment, &table());
        assert_eq!(response.status, 204);
        assert_eq!(response.body, ResponseBody::Empty);
        assert_eq!(
            response.header_value(CLIENT_REDIRECT_HEADER),
            Some("/admin/tags/")
        );
    }

    #[test]
    fn fragment_failures_are_400() {
        let cases = [
            OutcomeReport::validation_error(
                MutationAction::Create,
                EntityKind::Tag,
                ValidationErrors::single("name", "This field is required."),
            ),
            OutcomeReport::not_found(MutationAction::Update, EntityKind::Tag, 5),
            OutcomeReport::persistence_error(MutationAction::Create, EntityKind::Tag, "boom"),
        ];
        let expected = [
            "name: This field is required.",
            "Tag not found.",
            "Failed to create tag.",
        ];
        for (outcome, message) in cases.iter().zip(expected) {
            let response = resolve(outcome, RequestMode::Fragment, &table());
            assert_eq!(response.status, 400);
            assert_eq!(
                response.body,
                ResponseBody::ErrorFragment {
                    message: message.to_string()
                }
            );
        }
    }

    #[test]
    fn warnings_become_secondary_flashes() {
        let mut outcome = OutcomeReport::success(MutationAction::Create, tag(1));
        outcome.warnings.push("Audit trail could not be recorded.".into());
        let response = resolve(&outcome, RequestMode::Standard, &table());
        assert_eq!(response.status, 302);
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.warnings[0].category, FlashCategory::Warning);
    }

    #[test]
    fn message_table_covers_every_pair() {
        let table = table();
        assert_eq!(
            table.success(MutationAction::Delete, EntityKind::Organization),
            "Organization deleted successfully."
        );
        assert_eq!(
            table.failure(MutationAction::Update, EntityKind::Bot),
            "Failed to update bot."
        );
        assert_eq!(table.not_found(EntityKind::Stipend), "Stipend not found.");
    }
}
