//! Instructor add/drop handler.
//!
//! Diffs the instructor sets of the previous and current section snapshots.
//! Nothing is loaded while the campus time schedule is under construction.

use crate::domain::config::DispatchConfig;
use crate::domain::errors::{IngestError, LoadError, SkipReason};
use crate::domain::events::{section_ref, InstructorPayload};
use crate::domain::outcome::HandlerReport;
use crate::domain::records::{EnrollmentRole, EnrollmentStatus, EnrollmentUpdate};
use crate::ports::outbound::{ScheduleGate, UpdateSink};
use chrono::{DateTime, Utc};
use ec_01_message_extraction::ExtractedPayload;
use shared_types::EventCategory;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructorChange {
    Add,
    Drop,
}

impl InstructorChange {
    fn status(&self) -> EnrollmentStatus {
        match self {
            InstructorChange::Add => EnrollmentStatus::Active,
            InstructorChange::Drop => EnrollmentStatus::Deleted,
        }
    }
}

pub struct InstructorHandler {
    sink: Arc<dyn UpdateSink>,
    schedule: Arc<dyn ScheduleGate>,
    default_campus: String,
}

impl InstructorHandler {
    pub fn new(
        sink: Arc<dyn UpdateSink>,
        schedule: Arc<dyn ScheduleGate>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            sink,
            schedule,
            default_campus: config.default_campus.clone(),
        }
    }

    /// `modified` is the envelope timestamp, stamped on every update.
    pub async fn handle(
        &self,
        change: InstructorChange,
        payload: &ExtractedPayload,
        modified: DateTime<Utc>,
    ) -> Result<HandlerReport, IngestError> {
        let payload: InstructorPayload = payload.decode()?;
        let mut report = HandlerReport::new(EventCategory::Instructor);

        let current = &payload.current;
        let section = section_ref(&current.section, current.section.primary_section.as_ref());
        let course = &current.section.course;
        let campus = current
            .campus()
            .unwrap_or(&self.default_campus)
            .to_lowercase();

        let current_ids = current.instructor_ids();
        let previous_ids = payload
            .previous
            .as_ref()
            .map(|p| p.instructor_ids())
            .unwrap_or_default();

        let changed: Vec<String> = match change {
            InstructorChange::Add => current_ids
                .into_iter()
                .filter(|id| !previous_ids.contains(id))
                .collect(),
            InstructorChange::Drop => previous_ids
                .into_iter()
                .filter(|id| !current_ids.contains(id))
                .collect(),
        };

        if changed.is_empty() {
            return Ok(report);
        }

        if self
            .schedule
            .is_under_construction(&campus, &course.year, &course.quarter)
            .await?
        {
            let term = format!("{} {}", course.year, course.quarter);
            match change {
                InstructorChange::Add => warn!(
                    section = %section,
                    campus = %campus,
                    instructors = ?changed,
                    "ignoring instructor add during time schedule construction"
                ),
                InstructorChange::Drop => error!(
                    section = %section,
                    campus = %campus,
                    instructors = ?changed,
                    "ignoring instructor drop during time schedule construction"
                ),
            }
            report.skip(SkipReason::ScheduleUnderConstruction { campus, term });
            return Ok(report);
        }

        let updates: Vec<EnrollmentUpdate> = changed
            .iter()
            .map(|reg_id| {
                let mut update = EnrollmentUpdate::new(
                    &section,
                    reg_id.clone(),
                    EnrollmentRole::Instructor,
                    change.status(),
                    modified,
                );
                if current.independent_study {
                    update.section_sis_id = format!("{}-{}", update.section_sis_id, reg_id);
                    update.instructor_reg_id = Some(reg_id.clone());
                }
                update
            })
            .collect();

        let submitted = updates.len();
        self.sink
            .submit_batch(&updates)
            .await
            .map_err(|source| LoadError {
                applied: source.applied,
                submitted,
                source,
            })?;
        info!(section = %section, ?change, count = submitted, "instructor updates loaded");

        for _ in 0..submitted {
            report.loaded();
        }
        Ok(report.with_recorded(1))
    }
}
