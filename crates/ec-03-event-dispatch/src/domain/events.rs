//! # Event Payload Shapes
//!
//! Typed views of decrypted payloads. Optional fields are optional here so
//! that a single malformed event can be skipped without failing its batch.

use crate::domain::records::{GroupMember, PrimarySectionRef, SectionRef};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `2024` or `"2024"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// =============================================================================
// Sections (enrollment and instructor events)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CourseData {
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    pub quarter: String,
    pub curriculum_abbreviation: String,
    #[serde(deserialize_with = "string_or_number")]
    pub course_number: String,
    #[serde(default)]
    pub course_campus: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimarySectionData {
    #[serde(rename = "Course", default)]
    pub course: Option<CourseData>,
    #[serde(rename = "SectionID", default)]
    pub section_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionData {
    #[serde(rename = "Course")]
    pub course: CourseData,
    #[serde(rename = "SectionID")]
    pub section_id: String,
    #[serde(rename = "PrimarySection", default)]
    pub primary_section: Option<PrimarySectionData>,
}

/// Section identity from section data plus an optional primary-section
/// block. A primary block with course data marks the section as linked.
pub fn section_ref(section: &SectionData, primary: Option<&PrimarySectionData>) -> SectionRef {
    let course = &section.course;
    let primary = primary.and_then(|p| {
        p.course.as_ref().map(|pc| PrimarySectionRef {
            curriculum: pc.curriculum_abbreviation.clone(),
            course_number: pc.course_number.clone(),
            section_id: p.section_id.clone().unwrap_or_default(),
        })
    });

    SectionRef {
        year: course.year.clone(),
        quarter: course.quarter.clone(),
        curriculum: course.curriculum_abbreviation.clone(),
        course_number: course.course_number.clone(),
        section_id: section.section_id.clone(),
        primary,
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// Enrollment payload: a list of per-person, per-section events. Events
/// stay untyped until each one is processed.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentPayload {
    #[serde(rename = "Events")]
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionData {
    #[serde(rename = "Code")]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegIdData {
    #[serde(rename = "UWRegID", default)]
    pub reg_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentEvent {
    #[serde(rename = "Action")]
    pub action: ActionData,
    #[serde(rename = "Section")]
    pub section: SectionData,
    #[serde(rename = "PrimarySection", default)]
    pub primary_section: Option<PrimarySectionData>,
    #[serde(rename = "Person")]
    pub person: RegIdData,
    #[serde(rename = "LastModified")]
    pub last_modified: String,
    #[serde(rename = "Auditor", default)]
    pub auditor: Option<Value>,
    #[serde(rename = "RequestDate", default)]
    pub request_date: Option<String>,
    #[serde(rename = "Instructor", default)]
    pub instructor: Option<RegIdData>,
}

// =============================================================================
// Instructor add/drop
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorRef {
    #[serde(rename = "RegID")]
    pub reg_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingData {
    #[serde(rename = "Instructors", default)]
    pub instructors: Vec<InstructorRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionSnapshot {
    #[serde(flatten)]
    pub section: SectionData,
    #[serde(rename = "Meetings", default)]
    pub meetings: Vec<MeetingData>,
    #[serde(rename = "IndependentStudy", default)]
    pub independent_study: bool,
    #[serde(rename = "CourseCampus", default)]
    pub course_campus: Option<String>,
}

impl SectionSnapshot {
    /// Instructor registry ids across every meeting, deduplicated, in order.
    pub fn instructor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for instructor in self.meetings.iter().flat_map(|m| m.instructors.iter()) {
            if !ids.contains(&instructor.reg_id) {
                ids.push(instructor.reg_id.clone());
            }
        }
        ids
    }

    /// Campus of the section, from the section or its course.
    pub fn campus(&self) -> Option<&str> {
        self.course_campus
            .as_deref()
            .or(self.section.course.course_campus.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorPayload {
    #[serde(rename = "Current")]
    pub current: SectionSnapshot,
    #[serde(rename = "Previous", default)]
    pub previous: Option<SectionSnapshot>,
}

// =============================================================================
// Person
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonSnapshot {
    #[serde(rename = "UWNetID", default)]
    pub net_id: Option<String>,
    #[serde(rename = "RegID", default)]
    pub reg_id: Option<String>,
    #[serde(rename = "StudentName", default)]
    pub student_name: Option<String>,
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonPayload {
    #[serde(rename = "Current", default)]
    pub current: Option<PersonSnapshot>,
    #[serde(rename = "Previous", default)]
    pub previous: Option<PersonSnapshot>,
}

// =============================================================================
// Group
// =============================================================================

/// Action context carried base64-encoded in the group header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupContext {
    pub action: String,
    pub group: String,
}

/// Body of an `update-members` action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembersBody {
    #[serde(default, alias = "add-members")]
    pub add_members: Vec<GroupMember>,
    #[serde(default, alias = "delete-members")]
    pub delete_members: Vec<GroupMember>,
}

/// Body of a `delete-group` action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteGroupBody {
    #[serde(default)]
    pub group: Option<String>,
}

/// Body of a `change-subject-name` action.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSubjectNameBody {
    #[serde(alias = "old-name")]
    pub old_name: String,
    #[serde(alias = "new-name")]
    pub new_name: String,
}
