//! The entity-mutation pipeline.
//!
//! `execute` runs one create/update/delete end to end: validate the payload,
//! load the before-state, write inside a transaction, then audit and notify.
//! Only validation, not-found, and persistence failures reach the caller;
//! audit and notifier failures are logged and surface as warnings.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use bursary_core::entities::{Entity, Fields, NewAuditRecord, NewNotification};
use bursary_core::enums::{
    AuditAction, EntityKind, MutationAction, NotificationPriority, NotificationType, RequestMode,
};
use bursary_core::outcome::OutcomeReport;
use bursary_core::response::{RenderedResponse, resolve};
use bursary_core::validation::{
    Payload, PayloadScope, ValidationContext, ValidationErrors, parse_target_id, validate_payload,
};

use crate::error::{AuditError, DatabaseError};
use crate::service::BursaryService;
use crate::store::EntityStore;

/// Shown alongside a successful mutation whose audit record could not be written.
pub const AUDIT_FAILURE_WARNING: &str =
    "The change was saved, but the audit trail could not be updated.";

/// One administrative mutation as submitted by a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub action: MutationAction,
    pub entity_kind: EntityKind,
    /// Raw form fields. Update and delete carry the target in `id`.
    pub payload: Payload,
    /// Acting user; `None` or `Some(0)` is the system.
    pub actor: Option<i64>,
    pub mode: RequestMode,
    pub ip: Option<String>,
}

impl MutationRequest {
    #[must_use]
    pub fn new(action: MutationAction, entity_kind: EntityKind) -> Self {
        Self {
            action,
            entity_kind,
            payload: Payload::new(),
            actor: None,
            mode: RequestMode::Standard,
            ip: None,
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload.extend(payload);
        self
    }

    #[must_use]
    pub const fn actor(mut self, actor: Option<i64>) -> Self {
        self.actor = actor;
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: Option<&str>) -> Self {
        self.ip = ip.map(String::from);
        self
    }
}

/// A validated mutation ready to hit the store.
#[derive(Debug)]
enum Plan {
    Create(Fields),
    Update(i64, Fields),
    Delete(i64),
}

impl Plan {
    const fn target(&self) -> Option<i64> {
        match self {
            Self::Create(_) => None,
            Self::Update(id, _) | Self::Delete(id) => Some(*id),
        }
    }
}

fn merge(into: &mut ValidationErrors, from: &ValidationErrors) {
    for (field, messages) in from.iter() {
        for message in messages {
            into.add(field, message.clone());
        }
    }
}

fn plan_mutation(request: &MutationRequest, ctx: &ValidationContext) -> Result<Plan, ValidationErrors> {
    let kind = request.entity_kind;
    let payload = &request.payload;
    match request.action {
        MutationAction::Create => {
            validate_payload(kind, payload, PayloadScope::Full, ctx).map(Plan::Create)
        }
        MutationAction::Update => {
            match (
                parse_target_id(payload),
                validate_payload(kind, payload, PayloadScope::Partial, ctx),
            ) {
                (Ok(id), Ok(fields)) => Ok(Plan::Update(id, fields)),
                (id, fields) => {
                    let mut errors = ValidationErrors::new();
                    if let Err(e) = &id {
                        merge(&mut errors, e);
                    }
                    if let Err(e) = &fields {
                        merge(&mut errors, e);
                    }
                    Err(errors)
                }
            }
        }
        MutationAction::Delete => parse_target_id(payload).map(Plan::Delete),
    }
}

impl BursaryService {
    /// Run one mutation through validate → persist → audit → notify.
    ///
    /// Never fails: every outcome, including store errors, is reported in
    /// the returned [`OutcomeReport`].
    pub async fn execute(&self, request: &MutationRequest) -> OutcomeReport {
        let _gate = self.mutation_gate.lock().await;
        let now = self.now();
        let action = request.action;
        let kind = request.entity_kind;

        let plan = match plan_mutation(request, &self.validation_context(now)) {
            Ok(plan) => plan,
            Err(errors) => {
                warn!(entity = kind.as_str(), action = action.as_str(), %errors, "validation failed");
                if self.settings().audit_validation_failures {
                    self.audit_validation_failure(request, &errors, now).await;
                }
                return OutcomeReport::validation_error(action, kind, errors);
            }
        };
        debug!(entity = kind.as_str(), action = action.as_str(), "payload validated");

        let before = match plan.target() {
            None => None,
            Some(id) => match self.store().get(kind, id).await {
                Ok(Some(entity)) => Some(entity),
                Ok(None) => {
                    warn!(entity = kind.as_str(), action = action.as_str(), id, "target not found");
                    return OutcomeReport::not_found(action, kind, id);
                }
                Err(e) => {
                    error!(entity = kind.as_str(), action = action.as_str(), id, error = %e, "loading target failed");
                    return OutcomeReport::persistence_error(action, kind, e.to_string());
                }
            },
        };

        let entity = match self.apply(kind, &plan, before.as_ref(), now).await {
            Ok(entity) => entity,
            Err(e) => {
                error!(
                    entity = kind.as_str(),
                    action = action.as_str(),
                    id = plan.target(),
                    error = %e,
                    "mutation rolled back"
                );
                return OutcomeReport::persistence_error(action, kind, e.to_string());
            }
        };
        debug!(entity = kind.as_str(), action = action.as_str(), id = entity.id, "mutation committed");

        let mut report = OutcomeReport::success(action, entity);
        self.audit_mutation(request, before.as_ref(), &mut report, now)
            .await;
        report
    }

    /// [`Self::execute`] followed by response resolution in the request's mode.
    pub async fn execute_and_resolve(
        &self,
        request: &MutationRequest,
    ) -> (OutcomeReport, RenderedResponse) {
        let report = self.execute(request).await;
        let response = resolve(&report, request.mode, self.messages());
        (report, response)
    }

    /// Write the planned change in one transaction. Rolled back on any error.
    async fn apply(
        &self,
        kind: EntityKind,
        plan: &Plan,
        before: Option<&Entity>,
        now: DateTime<Utc>,
    ) -> Result<Entity, DatabaseError> {
        let tx = self.db().conn().transaction().await?;
        let result = {
            let store = EntityStore::new(&tx);
            match (plan, before) {
                (Plan::Create(fields), _) => store.create(kind, fields, now).await,
                (Plan::Update(_, fields), Some(entity)) => store.update(entity, fields, now).await,
                (Plan::Delete(_), Some(entity)) => {
                    store.delete(entity).await.map(|()| entity.clone())
                }
                _ => Err(DatabaseError::InvalidState(
                    "update or delete without a loaded target".into(),
                )),
            }
        };

        match result {
            Ok(entity) => {
                tx.commit().await?;
                Ok(entity)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(entity = kind.as_str(), error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Record the completed transition. Failures become a warning and a
    /// best-effort system notification.
    async fn audit_mutation(
        &self,
        request: &MutationRequest,
        before: Option<&Entity>,
        report: &mut OutcomeReport,
        now: DateTime<Utc>,
    ) {
        let Some(entity) = report.entity.as_ref() else {
            return;
        };
        let action = request.action;
        let kind = entity.kind;
        let id = entity.id;
        let after = match action {
            MutationAction::Delete => None,
            MutationAction::Create | MutationAction::Update => Some(entity.snapshot()),
        };

        let builder = NewAuditRecord::builder()
            .actor(request.actor)
            .action(action.audit_action())
            .target(kind.as_str(), Some(id))
            .details(format!("{kind} {id} {}", action.past_tense()))
            .before(before.map(Entity::snapshot))
            .after(after)
            .ip(request.ip.as_deref())
            .at(now);

        match self.record_audit(builder).await {
            Ok(record) => report.audit_id = Some(record.id),
            Err(e) => {
                error!(entity = kind.as_str(), action = action.as_str(), id, error = %e, "audit recording failed");
                report.warnings.push(AUDIT_FAILURE_WARNING.to_string());
                let alert = NewNotification::new(
                    NotificationType::System,
                    format!("Audit logging failed for {} on {kind} {id}", action.as_str()),
                )
                .priority(NotificationPriority::High)
                .related(kind.as_str(), Some(id));
                let _ = self.notify(alert).await;
            }
        }
    }

    /// Optional `validation_error` record for a rejected submission. No notification.
    async fn audit_validation_failure(
        &self,
        request: &MutationRequest,
        errors: &ValidationErrors,
        now: DateTime<Utc>,
    ) {
        let builder = NewAuditRecord::builder()
            .actor(request.actor)
            .action(AuditAction::ValidationError)
            .target(
                request.entity_kind.as_str(),
                parse_target_id(&request.payload).ok(),
            )
            .details(errors.to_string())
            .ip(request.ip.as_deref())
            .at(now);

        let recorded = async {
            let record = builder.build()?;
            self.insert_audit(record).await?;
            Ok::<(), AuditError>(())
        }
        .await;

        if let Err(e) = recorded {
            error!(
                entity = request.entity_kind.as_str(),
                action = request.action.as_str(),
                error = %e,
                "validation failure audit dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use bursary_core::outcome::OutcomeKind;

    use crate::repos::audit::AuditFilter;
    use crate::service::PipelineSettings;
    use crate::test_support::helpers::{test_now, test_service, test_service_with};

    fn ctx() -> ValidationContext {
        ValidationContext {
            now: test_now(),
            tz: chrono_tz::Tz::UTC,
            bounds: bursary_core::validation::DateBounds::default(),
        }
    }

    #[test]
    fn update_merges_id_and_field_errors() {
        let request = MutationRequest::new(MutationAction::Update, EntityKind::Tag)
            .field("name", "x".repeat(101));
        let errors = plan_mutation(&request, &ctx()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("id"), Some(&["This field is required.".to_string()][..]));
        assert!(errors.get("name").is_some());
    }

    #[test]
    fn delete_only_needs_id() {
        let request = MutationRequest::new(MutationAction::Delete, EntityKind::Stipend)
            .field("id", "4");
        assert!(matches!(plan_mutation(&request, &ctx()), Ok(Plan::Delete(4))));
    }

    #[test]
    fn create_ignores_unknown_keys() {
        let request = MutationRequest::new(MutationAction::Create, EntityKind::Tag)
            .field("name", "Research")
            .field("csrf_token", "abc")
            .field("submit", "Save");
        let Ok(Plan::Create(fields)) = plan_mutation(&request, &ctx()) else {
            panic!("expected a create plan");
        };
        assert_eq!(fields.len(), 2);
        assert!(!fields.contains_key("csrf_token"));
    }

    #[tokio::test]
    async fn create_writes_audit_with_after_snapshot() {
        let svc = test_service().await;
        let request = MutationRequest::new(MutationAction::Create, EntityKind::Tag)
            .field("name", "Research")
            .actor(Some(7))
            .ip(Some("198.51.100.4"));

        let report = svc.execute(&request).await;
        assert_eq!(report.kind, OutcomeKind::Success);
        assert!(report.warnings.is_empty());

        let audit = svc.query_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(report.audit_id, Some(audit[0].id));
        assert_eq!(audit[0].details, "tag 1 created");
        assert_eq!(audit[0].details_before, None);
        assert_eq!(
            audit[0].details_after.as_ref().and_then(|v| v.get("name")),
            Some(&serde_json::json!("Research"))
        );
        assert_eq!(audit[0].ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(audit[0].timestamp, test_now());
    }

    #[tokio::test]
    async fn validation_failure_audit_is_opt_in() {
        let quiet = test_service().await;
        let request = MutationRequest::new(MutationAction::Create, EntityKind::Tag).actor(Some(3));
        quiet.execute(&request).await;
        assert_eq!(quiet.count_audit().await.unwrap(), 0);

        let loud = test_service_with(PipelineSettings {
            audit_validation_failures: true,
            ..PipelineSettings::default()
        })
        .await;
        let report = loud.execute(&request).await;
        assert_eq!(report.kind, OutcomeKind::ValidationError);

        let audit = loud.query_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::ValidationError);
        assert_eq!(audit[0].object_id, None);
        assert_eq!(audit[0].details, "name: This field is required.");
        assert_eq!(loud.unread_notification_count(3).await.unwrap(), 0);
    }
}
