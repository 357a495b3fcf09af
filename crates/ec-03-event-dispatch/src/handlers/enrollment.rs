//! Enrollment change handler.
//!
//! Action codes: `A` added and `S` standby both map to active, `D` to
//! deleted. Any other code skips that one event. All updates of a message
//! go to the sink as one batch.

use crate::domain::errors::{IngestError, LoadError, SkipReason, UnknownActionError};
use crate::domain::events::{section_ref, EnrollmentEvent, EnrollmentPayload};
use crate::domain::outcome::HandlerReport;
use crate::domain::records::{EnrollmentRole, EnrollmentStatus, EnrollmentUpdate};
use crate::domain::timestamps::parse_iso8601;
use crate::ports::outbound::UpdateSink;
use ec_01_message_extraction::ExtractedPayload;
use serde_json::Value;
use shared_types::EventCategory;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct EnrollmentHandler {
    sink: Arc<dyn UpdateSink>,
}

impl EnrollmentHandler {
    pub fn new(sink: Arc<dyn UpdateSink>) -> Self {
        Self { sink }
    }

    pub async fn handle(&self, payload: &ExtractedPayload) -> Result<HandlerReport, IngestError> {
        let payload: EnrollmentPayload = payload.decode()?;
        let mut report = HandlerReport::new(EventCategory::Enrollment);
        let mut updates = Vec::with_capacity(payload.events.len());

        for raw in payload.events {
            match build_update(raw) {
                Ok(update) => updates.push(update),
                Err(reason) => report.skip(reason),
            }
        }

        if !updates.is_empty() {
            let submitted = updates.len();
            self.sink
                .submit_batch(&updates)
                .await
                .map_err(|source| LoadError {
                    applied: source.applied,
                    submitted,
                    source,
                })?;
            info!(loaded = submitted, "enrollment updates loaded");
            for _ in 0..submitted {
                report.loaded();
            }
        }

        Ok(report.with_recorded(updates.len() as u64))
    }
}

fn build_update(raw: Value) -> Result<EnrollmentUpdate, SkipReason> {
    let event: EnrollmentEvent = serde_json::from_value(raw).map_err(|e| {
        warn!(error = %e, "skipping malformed enrollment event");
        SkipReason::MalformedEvent(e.to_string())
    })?;

    let section = section_ref(&event.section, event.primary_section.as_ref());
    let reg_id = match event.person.reg_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            warn!(section = %section, "skipping enrollment event without registry id");
            return Err(SkipReason::MalformedEvent("Person.UWRegID".to_string()));
        }
    };

    let status = match event.action.code.to_ascii_uppercase().as_str() {
        "A" => EnrollmentStatus::Active,
        "S" => {
            debug!(reg_id = %reg_id, section = %section, "add standby");
            EnrollmentStatus::Active
        }
        "D" => EnrollmentStatus::Deleted,
        _ => {
            warn!(
                code = %event.action.code,
                reg_id = %reg_id,
                last_modified = %event.last_modified,
                "unhandled enrollment action code"
            );
            return Err(SkipReason::UnknownAction(UnknownActionError {
                code: event.action.code.clone(),
                subject: reg_id,
            }));
        }
    };

    let last_modified = parse_iso8601(&event.last_modified).ok_or_else(|| {
        warn!(reg_id = %reg_id, value = %event.last_modified, "unparseable LastModified");
        SkipReason::MalformedEvent(format!("LastModified {:?}", event.last_modified))
    })?;

    let role = match &event.auditor {
        Some(Value::Bool(false)) | None => EnrollmentRole::Student,
        Some(_) => EnrollmentRole::Auditor,
    };

    let mut update = EnrollmentUpdate::new(&section, reg_id, role, status, last_modified);
    update.request_date = event.request_date.as_deref().and_then(parse_iso8601);
    update.instructor_reg_id = event.instructor.and_then(|i| i.reg_id);
    Ok(update)
}
