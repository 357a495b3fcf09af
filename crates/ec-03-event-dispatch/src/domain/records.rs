//! # Downstream Records
//!
//! What the handlers hand to the sink and stores: enrollment updates,
//! identity records, course groups and their members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enrollment updates
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentRole {
    Student,
    Auditor,
    Instructor,
}

/// Section identity.
///
/// Course SIS id is `{year}-{quarter}-{CURRICULUM}-{number}`; section SIS id
/// appends `-{SECTION}`. A linked section also names its primary section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub year: String,
    pub quarter: String,
    pub curriculum: String,
    pub course_number: String,
    pub section_id: String,
    /// Present when this is a linked (secondary) section.
    pub primary: Option<PrimarySectionRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimarySectionRef {
    pub curriculum: String,
    pub course_number: String,
    pub section_id: String,
}

impl SectionRef {
    pub fn is_primary(&self) -> bool {
        self.primary.is_none()
    }

    fn term_prefix(&self) -> String {
        format!("{}-{}", self.year, self.quarter.to_lowercase())
    }

    /// SIS id of the course this section belongs to.
    pub fn course_sis_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.term_prefix(),
            self.curriculum.to_uppercase(),
            self.course_number
        )
    }

    /// SIS id of this section.
    pub fn section_sis_id(&self) -> String {
        format!("{}-{}", self.course_sis_id(), self.section_id.to_uppercase())
    }

    /// SIS id of the primary section; this section's own id when primary.
    pub fn primary_section_sis_id(&self) -> String {
        match &self.primary {
            Some(p) => format!(
                "{}-{}-{}-{}",
                self.term_prefix(),
                p.curriculum.to_uppercase(),
                p.course_number,
                p.section_id.to_uppercase()
            ),
            None => self.section_sis_id(),
        }
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.section_sis_id())
    }
}

/// One normalized enrollment change submitted to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentUpdate {
    pub section_sis_id: String,
    pub primary_section_sis_id: String,
    pub course_sis_id: String,
    pub reg_id: String,
    pub role: EnrollmentRole,
    pub status: EnrollmentStatus,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_reg_id: Option<String>,
}

impl EnrollmentUpdate {
    pub fn new(
        section: &SectionRef,
        reg_id: impl Into<String>,
        role: EnrollmentRole,
        status: EnrollmentStatus,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            section_sis_id: section.section_sis_id(),
            primary_section_sis_id: section.primary_section_sis_id(),
            course_sis_id: section.course_sis_id(),
            reg_id: reg_id.into(),
            role,
            status,
            last_modified,
            request_date: None,
            instructor_reg_id: None,
        }
    }
}

// =============================================================================
// Provisioning priority
// =============================================================================

/// Reimport priority of a locally tracked record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    None,
    #[default]
    Default,
    High,
    Immediate,
}

// =============================================================================
// Identities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub reg_id: String,
    pub net_id: String,
    pub priority: Priority,
}

// =============================================================================
// Groups
// =============================================================================

/// Value of `deleted_by` on groups removed by an upstream event.
pub const DELETED_BY_EVENT: &str = "gws-event";

/// A membership group registered against a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub group_id: String,
    pub course_id: String,
    pub role: String,
    /// Identity the group was registered by; membership lookups act as it.
    pub added_by: String,
    pub is_deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_date: Option<DateTime<Utc>>,
    pub priority: Priority,
}

impl GroupRecord {
    pub fn new(
        group_id: impl Into<String>,
        course_id: impl Into<String>,
        role: impl Into<String>,
        added_by: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            course_id: course_id.into(),
            role: role.into(),
            added_by: added_by.into(),
            is_deleted: false,
            deleted_by: None,
            deleted_date: None,
            priority: Priority::Default,
        }
    }
}

/// A group nested (at any depth) inside a root course group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGroupRecord {
    pub group_id: String,
    pub root_group_id: String,
    pub is_deleted: bool,
}

/// Kind of group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    #[serde(rename = "uwnetid")]
    NetId,
    Eppn,
    Group,
    #[serde(other)]
    Other,
}

/// A member as listed by the group service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    #[serde(alias = "id")]
    pub name: String,
}

impl GroupMember {
    pub fn new(member_type: MemberType, name: impl Into<String>) -> Self {
        Self {
            member_type,
            name: name.into(),
        }
    }

    pub fn net_id(name: impl Into<String>) -> Self {
        Self::new(MemberType::NetId, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(MemberType::Group, name)
    }
}

/// Identity of a course-member record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseMemberKey {
    pub name: String,
    pub member_type: MemberType,
    pub course_id: String,
    pub role: String,
}

/// A course member provisioned through a membership group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMember {
    pub key: CourseMemberKey,
    pub is_deleted: bool,
    pub priority: Priority,
    /// Set once the member has been picked up by an import.
    pub queue_id: Option<String>,
}

impl CourseMember {
    pub fn new(key: CourseMemberKey) -> Self {
        Self {
            key,
            is_deleted: false,
            priority: Priority::Default,
            queue_id: None,
        }
    }
}
