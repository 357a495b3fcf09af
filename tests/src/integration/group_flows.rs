//! # Group Flows
//!
//! Group-service messages carry their action in a base64 header context and
//! are not signed. The body is only decrypted once a sub-handler that acts
//! on it claims the group.

use super::fixtures::*;
use ec_01_message_extraction::ExtractionConfig;
use ec_02_activity_log::{minute_to_rfc3339, parse_timestamp, SampleRange};
use ec_03_event_dispatch::{
    CourseMember, DispatchConfig, EventIngestApi, GroupRecord, Priority, DELETED_BY_EVENT,
};
use serde_json::json;
use shared_types::EventCategory;

const COURSE_GROUP: &str = "u_cse142_students";
const COURSE: &str = "2024-autumn-CSE-142-A";

fn world_with_course_group() -> World {
    let world = World::new();
    world.rotate_current_key(GROUP.0, "g1", OLD_SECRET);
    world
        .store
        .add_group(GroupRecord::new(COURSE_GROUP, COURSE, "student", "owner"));
    world
}

fn member(world: &World, name: &str) -> Option<CourseMember> {
    world
        .store
        .course_member_records()
        .into_iter()
        .find(|m| m.key.name == name)
}

#[tokio::test]
async fn test_update_members_on_course_group() {
    let world = world_with_course_group();
    let envelope = world.group_event(
        "update-members",
        COURSE_GROUP,
        OLD_SECRET,
        &json!({
            "addMembers": [{"type": "uwnetid", "name": "jdoe"}],
            "deleteMembers": [{"type": "uwnetid", "name": "gone"}]
        }),
    );

    let report = world
        .engine
        .ingest_raw(envelope.to_json().as_bytes())
        .await
        .unwrap();

    assert_eq!(report.category, EventCategory::Group);
    assert_eq!(report.recorded, 2);

    let added = member(&world, "jdoe").unwrap();
    assert!(!added.is_deleted);
    assert_eq!(added.priority, Priority::Default);
    assert!(member(&world, "gone").unwrap().is_deleted);
    assert_eq!(
        world.activity.count(EventCategory::Group, world.minute()),
        2
    );
}

#[tokio::test]
async fn test_unowned_group_is_never_decrypted() {
    let world = world_with_course_group();
    let envelope = world.group_event(
        "update-members",
        "u_somebody_else",
        OLD_SECRET,
        &json!({"addMembers": [{"type": "uwnetid", "name": "jdoe"}]}),
    );

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 0);
    assert_eq!(world.keys.lookups(), 0);
    assert!(world.store.course_member_records().is_empty());
    assert_eq!(world.activity.bucket_count(EventCategory::Group), 0);
}

#[tokio::test]
async fn test_import_group_is_claimed_and_ignored() {
    let world = World::with_config(
        ExtractionConfig::default(),
        DispatchConfig::default().with_import_groups(["u_import"]),
    );
    world.rotate_current_key(GROUP.0, "g1", OLD_SECRET);
    let envelope = world.group_event(
        "update-members",
        "u_import",
        OLD_SECRET,
        &json!({"addMembers": [{"type": "uwnetid", "name": "jdoe"}]}),
    );

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 0);
    assert_eq!(world.keys.lookups(), 0);
}

#[tokio::test]
async fn test_delete_group_marks_course_group_deleted() {
    let world = world_with_course_group();
    let envelope = world.group_event("delete-group", COURSE_GROUP, OLD_SECRET, &json!({}));

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 1);
    let group = world.store.group(COURSE_GROUP).unwrap();
    assert!(group.is_deleted);
    assert_eq!(group.deleted_by.as_deref(), Some(DELETED_BY_EVENT));
    assert_eq!(group.priority, Priority::Immediate);
}

#[tokio::test]
async fn test_unknown_group_action_is_skipped() {
    let world = world_with_course_group();
    let envelope = world.group_event("frobnicate", COURSE_GROUP, OLD_SECRET, &json!({}));

    let report = world.engine.ingest(&envelope).await.unwrap();

    assert_eq!(report.recorded, 0);
    assert_eq!(report.skipped().count(), 1);
    assert_eq!(world.keys.lookups(), 0);
}

#[tokio::test]
async fn test_health_report_after_ingest() {
    let world = world_with_course_group();
    world.rotate_current_key(ENROLLMENT.0, "k1", OLD_SECRET);

    let group = world.group_event(
        "update-members",
        COURSE_GROUP,
        OLD_SECRET,
        &json!({"addMembers": [
            {"type": "uwnetid", "name": "alice"},
            {"type": "uwnetid", "name": "bob"}
        ]}),
    );
    world.engine.ingest(&group).await.unwrap();

    let begin = parse_timestamp(&minute_to_rfc3339(world.minute() - 2)).unwrap();
    let report = world
        .log
        .report(
            &[EventCategory::Group, EventCategory::Enrollment],
            SampleRange::Between { begin, end: None },
        )
        .await
        .unwrap();

    assert_eq!(report[&EventCategory::Group].points, vec![0, 0, 2]);
    assert_eq!(report[&EventCategory::Enrollment].points, vec![0, 0, 0]);
    assert_eq!(
        report[&EventCategory::Group].end,
        minute_to_rfc3339(world.minute())
    );
}
