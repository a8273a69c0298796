//! End-to-end mutation scenarios against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;

use bursary_core::clock::FixedClock;
use bursary_core::entities::FieldValue;
use bursary_core::enums::{
    AuditAction, EntityKind, MutationAction, NotificationPriority, NotificationType, RequestMode,
};
use bursary_core::outcome::OutcomeKind;
use bursary_core::response::{FlashCategory, ResponseBody};
use bursary_db::BursaryDb;
use bursary_db::orchestrator::{AUDIT_FAILURE_WARNING, MutationRequest};
use bursary_db::repos::audit::AuditFilter;
use bursary_db::repos::notification::NotificationFilter;
use bursary_db::service::{BursaryService, PipelineSettings};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

async fn service() -> BursaryService {
    let db = BursaryDb::open_local(":memory:").await.unwrap();
    BursaryService::from_db(db, Arc::new(FixedClock(now())), PipelineSettings::default())
}

async fn count(svc: &BursaryService, table: &str) -> i64 {
    let mut rows = svc
        .db()
        .conn()
        .query(&format!("SELECT count(*) FROM {table}"), ())
        .await
        .unwrap();
    rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
}

fn create_tag(name: &str) -> MutationRequest {
    MutationRequest::new(MutationAction::Create, EntityKind::Tag)
        .field("name", name)
        .actor(Some(7))
}

fn create_stipend(name: &str) -> MutationRequest {
    MutationRequest::new(MutationAction::Create, EntityKind::Stipend)
        .field("name", name)
        .field("summary", "Travel support for early-career researchers")
        .field("description", "Covers conference fees and lodging.")
        .field("homepage_url", "https://example.org/travel")
        .field("application_deadline", "2026-06-30 23:59:00")
        .field("open_for_applications", "y")
        .actor(Some(7))
}

#[tokio::test]
async fn create_tag_records_audit_and_notification() {
    let svc = service().await;

    let report = svc.execute(&create_tag("Research")).await;

    assert_eq!(report.kind, OutcomeKind::Success);
    let tag = report.entity.clone().unwrap();
    assert_eq!(tag.text("name"), Some("Research"));
    assert_eq!(svc.store().count(EntityKind::Tag).await.unwrap(), 1);

    let audit = svc.query_audit(&AuditFilter::default()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::Create);
    assert_eq!(audit[0].object_type, "tag");
    assert_eq!(audit[0].object_id, Some(tag.id));
    assert_eq!(audit[0].user_id, Some(7));

    let notes = svc
        .list_notifications(&NotificationFilter::default())
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].notification_type, NotificationType::CrudCreate);
    assert_eq!(notes[0].message, format!("Create operation on tag {}", tag.id));
    assert_eq!(notes[0].user_id, Some(7));
}

#[tokio::test]
async fn duplicate_tag_is_persistence_error_without_side_effects() {
    let svc = service().await;
    svc.execute(&create_tag("Research")).await;

    let report = svc.execute(&create_tag("Research")).await;

    assert_eq!(report.kind, OutcomeKind::PersistenceError);
    assert!(report.detail.as_deref().unwrap().contains("UNIQUE"));
    assert_eq!(count(&svc, "tags").await, 1);
    assert_eq!(svc.count_audit().await.unwrap(), 1);
    assert_eq!(count(&svc, "notification").await, 1);
}

#[tokio::test]
async fn delete_missing_tag_is_not_found() {
    let svc = service().await;

    let report = svc
        .execute(
            &MutationRequest::new(MutationAction::Delete, EntityKind::Tag)
                .field("id", "9999")
                .actor(Some(7)),
        )
        .await;

    assert_eq!(report.kind, OutcomeKind::NotFound);
    assert_eq!(report.entity, None);
    assert_eq!(svc.count_audit().await.unwrap(), 0);
    assert_eq!(count(&svc, "notification").await, 0);
}

#[tokio::test]
async fn update_missing_tag_is_not_found() {
    let svc = service().await;
    svc.execute(&create_tag("Research")).await;

    let report = svc
        .execute(
            &MutationRequest::new(MutationAction::Update, EntityKind::Tag)
                .field("id", "9999")
                .field("name", "Science")
                .actor(Some(7)),
        )
        .await;

    assert_eq!(report.kind, OutcomeKind::NotFound);
    assert_eq!(report.entity, None);
    assert_eq!(count(&svc, "tags").await, 1);
    assert_eq!(svc.count_audit().await.unwrap(), 1);
    assert_eq!(count(&svc, "notification").await, 1);
}

#[tokio::test]
async fn audit_failure_still_reports_success() {
    let svc = service().await;
    svc.db()
        .conn()
        .execute("DROP TABLE audit_log", ())
        .await
        .unwrap();

    let report = svc.execute(&create_tag("Research")).await;

    assert_eq!(report.kind, OutcomeKind::Success);
    assert_eq!(report.audit_id, None);
    assert_eq!(report.warnings, vec![AUDIT_FAILURE_WARNING.to_string()]);
    assert_eq!(svc.store().count(EntityKind::Tag).await.unwrap(), 1);

    let notes = svc
        .list_notifications(&NotificationFilter::default())
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].notification_type, NotificationType::System);
    assert_eq!(notes[0].priority, NotificationPriority::High);
    assert_eq!(notes[0].message, "Audit logging failed for create on tag 1");
}

#[tokio::test]
async fn notifier_failure_is_invisible() {
    let svc = service().await;
    svc.db()
        .conn()
        .execute("DROP TABLE notification", ())
        .await
        .unwrap();

    let report = svc.execute(&create_tag("Research")).await;

    assert_eq!(report.kind, OutcomeKind::Success);
    assert!(report.audit_id.is_some());
    assert!(report.warnings.is_empty());
    assert_eq!(svc.count_audit().await.unwrap(), 1);
}

#[tokio::test]
async fn bad_tag_link_rolls_back_stipend() {
    let svc = service().await;

    let report = svc
        .execute(&create_stipend("Travel Grant").field("tags", "42"))
        .await;

    assert_eq!(report.kind, OutcomeKind::PersistenceError);
    assert_eq!(count(&svc, "stipends").await, 0);
    assert_eq!(count(&svc, "stipend_tags").await, 0);
    assert_eq!(svc.count_audit().await.unwrap(), 0);
    assert_eq!(count(&svc, "notification").await, 0);
}

#[tokio::test]
async fn failed_link_update_rolls_back_stipend() {
    let svc = service().await;
    let tag = svc.execute(&create_tag("Physics")).await.entity_id().unwrap();
    let id = svc
        .execute(&create_stipend("Travel Grant").field("tags", tag.to_string()))
        .await
        .entity_id()
        .unwrap();

    let report = svc
        .execute(
            &MutationRequest::new(MutationAction::Update, EntityKind::Stipend)
                .field("id", id.to_string())
                .field("name", "Renamed Grant")
                .field("tags", format!("{tag},999"))
                .actor(Some(7)),
        )
        .await;

    assert_eq!(report.kind, OutcomeKind::PersistenceError);
    let reloaded = svc
        .store()
        .get(EntityKind::Stipend, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.text("name"), Some("Travel Grant"));
    assert_eq!(reloaded.get("tags"), Some(&FieldValue::Links(vec![tag])));
    assert_eq!(count(&svc, "stipend_tags").await, 1);
    assert_eq!(svc.count_audit().await.unwrap(), 2);
    assert_eq!(count(&svc, "notification").await, 2);
}

#[tokio::test]
async fn stipend_with_links_and_deadline() {
    let svc = service().await;
    let physics = svc.execute(&create_tag("Physics")).await.entity_id().unwrap();
    let travel = svc.execute(&create_tag("Travel")).await.entity_id().unwrap();

    let report = svc
        .execute(&create_stipend("Travel Grant").field("tags", format!("{travel}, {physics}")))
        .await;

    assert_eq!(report.kind, OutcomeKind::Success);
    let stipend = report.entity.unwrap();
    assert_eq!(
        stipend.get("tags"),
        Some(&FieldValue::Links(vec![physics, travel]))
    );
    assert_eq!(
        stipend.get("application_deadline"),
        Some(&FieldValue::Timestamp(
            Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 0).unwrap()
        ))
    );
    assert_eq!(
        stipend.get("open_for_applications"),
        Some(&FieldValue::Boolean(true))
    );
}

#[rstest]
#[case::past("2025-01-01 00:00:00", "Date must be in the future.")]
#[case::leap_day_in_common_year("2027-02-29 12:00:00", "February 29 is only valid in leap years.")]
#[case::beyond_horizon("2031-03-02 00:00:00", "Date cannot be more than 5 years in the future.")]
#[case::bad_layout("30.06.2026", "Invalid date format. Use YYYY-MM-DD HH:MM:SS.")]
#[tokio::test]
async fn bad_deadline_is_rejected_without_side_effects(
    #[case] deadline: &str,
    #[case] message: &str,
) {
    let svc = service().await;

    let report = svc
        .execute(&create_stipend("Deadline Grant").field("application_deadline", deadline))
        .await;

    assert_eq!(report.kind, OutcomeKind::ValidationError);
    assert_eq!(
        report.errors.get("application_deadline"),
        Some(&[message.to_string()][..])
    );
    assert_eq!(count(&svc, "stipends").await, 0);
    assert_eq!(svc.count_audit().await.unwrap(), 0);
    assert_eq!(count(&svc, "notification").await, 0);
}

#[tokio::test]
async fn update_records_before_and_after() {
    let svc = service().await;
    let id = svc.execute(&create_tag("Research")).await.entity_id().unwrap();

    let report = svc
        .execute(
            &MutationRequest::new(MutationAction::Update, EntityKind::Tag)
                .field("id", id.to_string())
                .field("name", "Science")
                .actor(Some(8)),
        )
        .await;

    assert_eq!(report.kind, OutcomeKind::Success);
    assert_eq!(report.entity.as_ref().unwrap().text("name"), Some("Science"));

    let audit = svc
        .query_audit(&AuditFilter {
            action: Some(AuditAction::Update),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(audit.len(), 1);
    let before = audit[0].details_before.as_ref().unwrap();
    let after = audit[0].details_after.as_ref().unwrap();
    assert_eq!(before["name"], "Research");
    assert_eq!(after["name"], "Science");
    assert_eq!(audit[0].user_id, Some(8));
}

#[tokio::test]
async fn delete_keeps_notifications_and_snapshots_before() {
    let svc = service().await;
    let id = svc.execute(&create_tag("Research")).await.entity_id().unwrap();

    let report = svc
        .execute(
            &MutationRequest::new(MutationAction::Delete, EntityKind::Tag)
                .field("id", id.to_string())
                .actor(Some(7)),
        )
        .await;

    assert_eq!(report.kind, OutcomeKind::Success);
    assert_eq!(svc.store().get(EntityKind::Tag, id).await.unwrap(), None);

    let audit = svc
        .query_audit(&AuditFilter {
            action: Some(AuditAction::Delete),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(audit[0].details_after, None);
    assert_eq!(audit[0].details_before.as_ref().unwrap()["name"], "Research");

    let notes = svc
        .list_notifications(&NotificationFilter::default())
        .await
        .unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.related_object_id == Some(id)));
}

#[tokio::test]
async fn deleting_a_tag_drops_its_stipend_links() {
    let svc = service().await;
    let tag = svc.execute(&create_tag("Physics")).await.entity_id().unwrap();
    let stipend = svc
        .execute(&create_stipend("Travel Grant").field("tags", tag.to_string()))
        .await
        .entity_id()
        .unwrap();

    svc.execute(
        &MutationRequest::new(MutationAction::Delete, EntityKind::Tag).field("id", tag.to_string()),
    )
    .await;

    let reloaded = svc
        .store()
        .get(EntityKind::Stipend, stipend)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.get("tags"), Some(&FieldValue::Links(vec![])));
}

#[tokio::test]
async fn standard_mode_redirects_to_listing() {
    let svc = service().await;

    let (_, response) = svc.execute_and_resolve(&create_tag("Research")).await;

    assert_eq!(response.status, 302);
    assert_eq!(response.header_value("location"), Some("/admin/tags/"));
    let flash = response.flash.unwrap();
    assert_eq!(flash.category, FlashCategory::Success);
    assert_eq!(flash.message, "Tag created successfully.");
}

#[tokio::test]
async fn fragment_mode_shapes() {
    let svc = service().await;

    let (report, created) = svc
        .execute_and_resolve(&create_tag("Research").mode(RequestMode::Fragment))
        .await;
    assert_eq!(created.status, 200);
    assert!(matches!(created.body, ResponseBody::Fragment { .. }));

    let (_, deleted) = svc
        .execute_and_resolve(
            &MutationRequest::new(MutationAction::Delete, EntityKind::Tag)
                .field("id", report.entity_id().unwrap().to_string())
                .mode(RequestMode::Fragment),
        )
        .await;
    assert_eq!(deleted.status, 204);
    assert_eq!(deleted.header_value("HX-Redirect"), Some("/admin/tags/"));

    let (_, invalid) = svc
        .execute_and_resolve(
            &MutationRequest::new(MutationAction::Create, EntityKind::Tag)
                .mode(RequestMode::Fragment),
        )
        .await;
    assert_eq!(invalid.status, 400);
    assert!(matches!(invalid.body, ResponseBody::ErrorFragment { .. }));
}

#[tokio::test]
async fn concurrent_mutations_are_serialized() {
    let svc = Arc::new(service().await);
    let mut handles = Vec::new();
    for i in 0..8 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.execute(&create_tag(&format!("Tag {i}"))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().kind, OutcomeKind::Success);
    }
    assert_eq!(svc.store().count(EntityKind::Tag).await.unwrap(), 8);
    assert_eq!(svc.count_audit().await.unwrap(), 8);
}
