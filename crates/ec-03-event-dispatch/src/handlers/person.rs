//! Person change handler.
//!
//! A change to names, net id or registry id raises the local identity
//! record to high priority, creating it if needed.

use crate::domain::errors::{IngestError, SkipReason};
use crate::domain::events::{PersonPayload, PersonSnapshot};
use crate::domain::outcome::HandlerReport;
use crate::domain::records::{IdentityRecord, Priority};
use crate::ports::outbound::IdentityStore;
use ec_01_message_extraction::ExtractedPayload;
use shared_types::EventCategory;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PersonHandler {
    identities: Arc<dyn IdentityStore>,
}

impl PersonHandler {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    pub async fn handle(&self, payload: &ExtractedPayload) -> Result<HandlerReport, IngestError> {
        let payload: PersonPayload = payload.decode()?;
        let mut report = HandlerReport::new(EventCategory::Person);

        let Some(latest) = payload.current.as_ref().or(payload.previous.as_ref()) else {
            return Err(IngestError::Payload("neither Current nor Previous present".into()));
        };
        let reg_id = match latest.reg_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warn!("skipping person change without registry id");
                report.skip(SkipReason::MalformedEvent("RegID".to_string()));
                return Ok(report);
            }
        };

        let net_id = match latest.net_id.as_deref() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                info!(reg_id = %reg_id, "ignoring person change without net id");
                report.skip(SkipReason::MissingNetId(reg_id));
                return Ok(report);
            }
        };

        if !changed(payload.previous.as_ref(), payload.current.as_ref()) {
            return Ok(report);
        }

        match self.identities.find_identity(&reg_id).await? {
            Some(mut existing) => {
                existing.priority = Priority::High;
                self.identities.save_identity(existing).await?;
            }
            None => {
                self.identities
                    .save_identity(IdentityRecord {
                        reg_id: reg_id.clone(),
                        net_id: net_id.clone(),
                        priority: Priority::High,
                    })
                    .await?;
            }
        }
        info!(reg_id = %reg_id, net_id = %net_id, "person queued for update");

        report.loaded();
        Ok(report.with_recorded(1))
    }
}

/// Whether a snapshot pair represents a change worth reprovisioning.
fn changed(previous: Option<&PersonSnapshot>, current: Option<&PersonSnapshot>) -> bool {
    match (previous, current) {
        (Some(p), Some(c)) => {
            p.student_name != c.student_name
                || p.first_name != c.first_name
                || p.last_name != c.last_name
                || p.net_id != c.net_id
                || p.reg_id != c.reg_id
        }
        _ => true,
    }
}
