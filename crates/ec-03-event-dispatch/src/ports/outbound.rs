//! # Outbound Ports (Driven Ports / SPI)
//!
//! Downstream sink, local record stores and upstream lookups the handlers
//! depend on. Calls carry no internal retry; the transport owns redelivery.

use crate::domain::records::{
    CourseMember, CourseMemberKey, EnrollmentUpdate, GroupMember, GroupRecord, IdentityRecord,
    MemberGroupRecord, Priority,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// The sink rejected a record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("sink rejected record {applied}: {reason}")]
pub struct SinkError {
    /// Records applied before the failure.
    pub applied: usize,
    pub reason: String,
}

/// A local record store operation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// An upstream lookup could not be completed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service}: {reason}")]
pub struct LookupError {
    pub service: &'static str,
    pub reason: String,
}

/// Effective membership lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("group {0} not found")]
    NotFound(String),

    #[error("group policy violation: {0}")]
    Policy(String),

    #[error("not authorized to read {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Transport(#[from] LookupError),
}

/// Downstream persistence of enrollment updates.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    /// Apply `updates` in order.
    ///
    /// Not transactional: on failure the records before the failing one
    /// remain applied and `SinkError::applied` says how many.
    async fn submit_batch(&self, updates: &[EnrollmentUpdate]) -> Result<usize, SinkError>;
}

/// Time-schedule construction status per campus and term.
#[async_trait]
pub trait ScheduleGate: Send + Sync {
    async fn is_under_construction(
        &self,
        campus: &str,
        year: &str,
        quarter: &str,
    ) -> Result<bool, LookupError>;
}

/// Local identity records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity(&self, reg_id: &str) -> Result<Option<IdentityRecord>, StoreError>;

    async fn save_identity(&self, record: IdentityRecord) -> Result<(), StoreError>;
}

/// Course groups, nested member groups and group-provisioned members.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Every group record with this name, deleted or not.
    async fn groups_named(&self, group_id: &str) -> Result<Vec<GroupRecord>, StoreError>;

    /// Every member-group record with this name, deleted or not.
    async fn member_groups_named(&self, group_id: &str)
        -> Result<Vec<MemberGroupRecord>, StoreError>;

    /// Whether any active member group hangs off `root_group_id`.
    async fn has_active_member_groups(&self, root_group_id: &str) -> Result<bool, StoreError>;

    /// Mark active groups named `group_id` deleted, at `Immediate` priority.
    async fn mark_group_deleted(
        &self,
        group_id: &str,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Mark active member groups named `group_id` deleted and return them.
    async fn mark_member_groups_deleted(
        &self,
        group_id: &str,
    ) -> Result<Vec<MemberGroupRecord>, StoreError>;

    /// Set the priority of active groups named `group_id`.
    async fn set_group_priority(&self, group_id: &str, priority: Priority)
        -> Result<usize, StoreError>;

    /// Rename a group everywhere it appears, as a group, member group or root.
    async fn rename_group(&self, old_name: &str, new_name: &str) -> Result<(), StoreError>;

    /// Create or update the member-group record for `(group_id, root_group_id)`.
    async fn upsert_member_group(
        &self,
        group_id: &str,
        root_group_id: &str,
        is_deleted: bool,
    ) -> Result<(), StoreError>;

    /// Every course-member record with this key. More than one is a duplicate.
    async fn course_members(&self, key: &CourseMemberKey) -> Result<Vec<CourseMember>, StoreError>;

    /// Store `member`, replacing every record with the same key.
    async fn save_course_member(&self, member: CourseMember) -> Result<(), StoreError>;
}

/// Members of a group after expanding nested groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveMembers {
    pub valid: Vec<GroupMember>,
    pub invalid: Vec<GroupMember>,
    /// Names of every readable group nested under the queried one.
    pub nested_groups: Vec<String>,
    /// Nested groups that could not be read, with the reason. Their members
    /// are missing from `valid`.
    pub unreadable_groups: Vec<(String, String)>,
}

/// Upstream group membership service.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn effective_members(
        &self,
        group_id: &str,
        act_as: &str,
    ) -> Result<EffectiveMembers, MembershipError>;

    async fn is_effective_member(
        &self,
        group_id: &str,
        member: &str,
        act_as: &str,
    ) -> Result<bool, MembershipError>;
}

/// Official system of record for course enrollment.
#[async_trait]
pub trait OfficialRoster: Send + Sync {
    /// Whether `net_id` holds an active official enrollment in `course_id`.
    async fn is_officially_enrolled(&self, course_id: &str, net_id: &str)
        -> Result<bool, StoreError>;
}
