//! # Ingest Flows
//!
//! Raw envelope in, records and activity out, through the real signature
//! verifier, key provider and AES decryption.
//!
//! 1. Enrollment add loads one record and counts one event
//! 2. Unknown action codes are skipped without loading
//! 3. Routing rejects undeclared versions before any key lookup
//! 4. A stale cached current key is refreshed exactly once
//! 5. Instructor adds wait for time-schedule construction to finish

use super::fixtures::*;
use ec_01_message_extraction::{ExtractionConfig, KeyCache};
use ec_03_event_dispatch::{
    DispatchConfig, EnrollmentRole, EnrollmentStatus, EventIngestApi, IngestError, Priority,
    ResponseClass, SkipReason,
};
use serde_json::json;
use shared_types::EventCategory;

#[tokio::test]
async fn test_enrollment_add_loads_record_and_counts_activity() {
    let world = World::new();
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);
    let envelope = world.signed(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("A", "R1"));

    let report = world
        .engine
        .ingest_raw(envelope.to_json().as_bytes())
        .await
        .unwrap();

    assert_eq!(report.category, EventCategory::Enrollment);
    assert_eq!(report.recorded, 1);

    let updates = world.store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].reg_id, "R1");
    assert_eq!(updates[0].section_sis_id, "2024-autumn-CSE-142-A");
    assert_eq!(updates[0].role, EnrollmentRole::Student);
    assert_eq!(updates[0].status, EnrollmentStatus::Active);
    assert_eq!(
        world.activity.count(EventCategory::Enrollment, world.minute()),
        1
    );
}

#[tokio::test]
async fn test_unknown_action_loads_nothing() {
    let world = World::new();
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);
    let envelope = world.signed(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("Q", "R1"));

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 0);
    assert!(matches!(
        report.skipped().next(),
        Some(SkipReason::UnknownAction(_))
    ));
    assert!(world.store.updates().is_empty());
    assert_eq!(world.activity.bucket_count(EventCategory::Enrollment), 0);
}

#[tokio::test]
async fn test_undeclared_version_rejected_before_key_lookup() {
    let world = World::new();
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);
    let envelope = world.signed(
        (ENROLLMENT.0, "1"),
        "m-1",
        OLD_SECRET,
        &enrollment_payload("A", "R1"),
    );

    let err = world.engine.ingest(&envelope).await.unwrap_err();

    assert!(matches!(err, IngestError::UnknownMessageType(_)));
    assert_eq!(err.response_class(), ResponseClass::BadRequest);
    assert_eq!(world.keys.lookups(), 0);
}

#[tokio::test]
async fn test_tampered_body_is_authentication_failure() {
    let world = World::new();
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);
    let mut envelope = world.signed(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("A", "R1"));
    envelope.body = seal(OLD_SECRET, &enrollment_payload("A", "R2").to_string());

    let err = world.engine.ingest(&envelope).await.unwrap_err();

    assert_eq!(err.response_class(), ResponseClass::AuthenticationFailure);
    assert_eq!(err.response_class().status_code(), 401);
    assert_eq!(world.keys.lookups(), 0);
    assert!(world.store.updates().is_empty());
}

#[tokio::test]
async fn test_signature_check_can_be_disabled() {
    let world = World::with_config(
        ExtractionConfig::default().with_validate_signature(false),
        DispatchConfig::default(),
    );
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);
    let envelope = unsigned(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("A", "R1"));

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 1);
}

#[tokio::test]
async fn test_rotated_current_key_refreshed_once() {
    let world = World::new();
    world.rotate_current_key(ENROLLMENT.0, "old", OLD_SECRET);
    let first = world.signed(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("A", "R1"));
    world.engine.ingest(&first).await.unwrap();
    let lookups_before = world.keys.lookups();

    world.rotate_current_key(ENROLLMENT.0, "new", NEW_SECRET);
    let second = world.signed(ENROLLMENT, "m-2", NEW_SECRET, &enrollment_payload("A", "R2"));
    let report = world.engine.ingest(&second).await.unwrap();

    assert_eq!(report.recorded, 1);
    assert_eq!(world.keys.lookups(), lookups_before + 1);
    assert_eq!(world.store.updates().len(), 2);
    assert_eq!(
        world.activity.count(EventCategory::Enrollment, world.minute()),
        2
    );
    assert_eq!(
        world
            .cache
            .get(&ec_01_message_extraction::CacheKey::Current(ENROLLMENT.0.into()))
            .map(|key| key.id().to_string()),
        Some("new".to_string())
    );
}

#[tokio::test]
async fn test_missing_key_is_authentication_failure() {
    let world = World::new();
    let envelope = world.signed(ENROLLMENT, "m-1", OLD_SECRET, &enrollment_payload("A", "R1"));

    let err = world.engine.ingest(&envelope).await.unwrap_err();

    assert!(matches!(err, IngestError::Extraction(_)));
    assert_eq!(err.response_class(), ResponseClass::AuthenticationFailure);
}

#[tokio::test]
async fn test_instructor_add_waits_for_schedule_construction() {
    let world = World::new();
    world.rotate_current_key(INSTRUCTOR_ADD.0, "k1", OLD_SECRET);
    world
        .schedule
        .set_under_construction("Bothell", "2024", "spring");
    let envelope = world.signed(
        INSTRUCTOR_ADD,
        "m-1",
        OLD_SECRET,
        &instructor_payload(&[], &["I1"]),
    );

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 0);
    assert!(matches!(
        report.skipped().next(),
        Some(SkipReason::ScheduleUnderConstruction { .. })
    ));
    assert!(world.store.updates().is_empty());
    assert_eq!(world.schedule.queries(), 1);
}

#[tokio::test]
async fn test_instructor_add_after_construction() {
    let world = World::new();
    world.rotate_current_key(INSTRUCTOR_ADD.0, "k1", OLD_SECRET);
    let envelope = world.signed(
        INSTRUCTOR_ADD,
        "m-1",
        OLD_SECRET,
        &instructor_payload(&[], &["I1"]),
    );

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 1);
    let updates = world.store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].reg_id, "I1");
    assert_eq!(updates[0].role, EnrollmentRole::Instructor);
    assert_eq!(
        world.activity.count(EventCategory::Instructor, world.minute()),
        1
    );
}

#[tokio::test]
async fn test_person_change_raises_identity_priority() {
    let world = World::new();
    world.rotate_current_key(PERSON.0, "k1", OLD_SECRET);
    let person = |first: &str| {
        json!({"UWNetID": "jdoe", "RegID": "R1", "FirstName": first,
               "LastName": "Doe", "StudentName": "Doe, J"})
    };
    let envelope = world.signed(
        PERSON,
        "m-1",
        OLD_SECRET,
        &json!({"Previous": person("Jane"), "Current": person("Janet")}),
    );

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 1);
    let identity = world.store.identity("R1").unwrap();
    assert_eq!(identity.net_id, "jdoe");
    assert_eq!(identity.priority, Priority::High);
}

#[tokio::test]
async fn test_garbage_input_is_bad_request() {
    let world = World::new();

    let err = world.engine.ingest_raw(b"not an envelope").await.unwrap_err();

    assert!(matches!(err, IngestError::Malformed(_)));
    assert_eq!(err.response_class().status_code(), 400);
    assert_eq!(world.keys.lookups(), 0);
}

#[tokio::test]
async fn test_non_utf8_input_is_bad_request() {
    let world = World::new();

    let err = world.engine.ingest_raw(b"\xff\xfe{\"Header\":").await.unwrap_err();

    assert!(matches!(err, IngestError::Malformed(_)));
    assert_eq!(err.response_class(), ResponseClass::BadRequest);
}
