//! # Event Engine
//!
//! The ingest pipeline for one message:
//!
//! 1. Parse the raw envelope
//! 2. Route on (message type, version), before any key lookup or decryption
//! 3. Verify the signature, for handlers that require one
//! 4. Decrypt and extract the payload
//! 5. Run the handler
//! 6. Record the handler's success count in the activity log
//!
//! Messages are processed strictly one at a time per call; the engine never
//! spawns work of its own.

use crate::adapters::MemoryRecordStore;
use crate::domain::config::DispatchConfig;
use crate::domain::errors::IngestError;
use crate::domain::outcome::HandlerReport;
use crate::domain::timestamps::parse_iso8601;
use crate::handlers::group::MembershipGroups;
use crate::handlers::{
    EnrollmentHandler, GroupHandler, HandlerKind, InstructorChange, InstructorHandler,
    PersonHandler,
};
use crate::ports::inbound::EventIngestApi;
use crate::ports::outbound::{
    GroupStore, IdentityStore, MembershipLookup, OfficialRoster, ScheduleGate, UpdateSink,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ec_01_message_extraction::{ExtractedPayload, MessageExtractionApi};
use ec_02_activity_log::ActivityLog;
use shared_types::{Envelope, EnvelopeHeader, TimeSource};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outbound ports the handlers depend on.
#[derive(Clone)]
pub struct EnginePorts {
    pub sink: Arc<dyn UpdateSink>,
    pub schedule: Arc<dyn ScheduleGate>,
    pub identities: Arc<dyn IdentityStore>,
    pub groups: Arc<dyn GroupStore>,
    pub membership: Arc<dyn MembershipLookup>,
    pub roster: Arc<dyn OfficialRoster>,
    pub time: Arc<dyn TimeSource>,
}

impl EnginePorts {
    /// Local ports all backed by one in-memory record store.
    pub fn with_store(
        store: Arc<MemoryRecordStore>,
        schedule: Arc<dyn ScheduleGate>,
        membership: Arc<dyn MembershipLookup>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            sink: store.clone(),
            identities: store.clone(),
            groups: store.clone(),
            roster: store,
            schedule,
            membership,
            time,
        }
    }
}

/// Message ingest and dispatch engine.
pub struct EventEngine {
    extraction: Arc<dyn MessageExtractionApi>,
    activity: Arc<ActivityLog>,
    time: Arc<dyn TimeSource>,
    enrollment: EnrollmentHandler,
    instructor: InstructorHandler,
    person: PersonHandler,
    group: GroupHandler,
}

impl EventEngine {
    pub fn new(
        extraction: Arc<dyn MessageExtractionApi>,
        activity: Arc<ActivityLog>,
        ports: EnginePorts,
        config: DispatchConfig,
    ) -> Self {
        let membership = MembershipGroups::new(
            ports.groups.clone(),
            ports.membership,
            ports.roster,
            ports.time.clone(),
        );
        Self {
            enrollment: EnrollmentHandler::new(ports.sink.clone()),
            instructor: InstructorHandler::new(ports.sink, ports.schedule, &config),
            person: PersonHandler::new(ports.identities),
            group: GroupHandler::new(extraction.clone(), ports.groups, membership, config),
            extraction,
            activity,
            time: ports.time,
        }
    }

    /// Envelope timestamp, or now when absent or unparseable.
    fn modified(&self, header: &EnvelopeHeader) -> DateTime<Utc> {
        header
            .timestamp
            .as_deref()
            .and_then(parse_iso8601)
            .unwrap_or_else(|| self.time.now_utc())
    }

    async fn extract(&self, envelope: &Envelope) -> Result<ExtractedPayload, IngestError> {
        Ok(self.extraction.extract(envelope).await?)
    }

    async fn process(&self, envelope: &Envelope) -> Result<HandlerReport, IngestError> {
        let header = &envelope.header;
        let kind = HandlerKind::route(header)?;
        debug!(?kind, message_id = %header.message_id.as_deref().unwrap_or(""), "routed");

        if kind.requires_signature() {
            self.extraction.authenticate(envelope).await?;
        }

        let report = match kind {
            HandlerKind::Enrollment => {
                self.enrollment.handle(&self.extract(envelope).await?).await?
            }
            HandlerKind::InstructorAdd => {
                self.instructor
                    .handle(
                        InstructorChange::Add,
                        &self.extract(envelope).await?,
                        self.modified(header),
                    )
                    .await?
            }
            HandlerKind::InstructorDrop => {
                self.instructor
                    .handle(
                        InstructorChange::Drop,
                        &self.extract(envelope).await?,
                        self.modified(header),
                    )
                    .await?
            }
            HandlerKind::Person => self.person.handle(&self.extract(envelope).await?).await?,
            HandlerKind::Group => self.group.handle(envelope).await?,
        };

        if report.recorded > 0 {
            self.activity
                .record_success(report.category, report.recorded)
                .await?;
        }
        Ok(report)
    }
}

#[async_trait]
impl EventIngestApi for EventEngine {
    async fn ingest_raw(&self, raw: &[u8]) -> Result<HandlerReport, IngestError> {
        let envelope = Envelope::from_json(raw).map_err(|e| {
            warn!(error = %e, bytes = raw.len(), "rejecting malformed envelope");
            IngestError::from(e)
        })?;
        self.ingest(&envelope).await
    }

    async fn ingest(&self, envelope: &Envelope) -> Result<HandlerReport, IngestError> {
        let header = &envelope.header;
        match self.process(envelope).await {
            Ok(report) => {
                info!(
                    message_type = %header.message_type_or_empty(),
                    message_id = %header.message_id.as_deref().unwrap_or(""),
                    category = %report.category,
                    recorded = report.recorded,
                    skipped = report.skipped().count(),
                    "message processed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    message_type = %header.message_type_or_empty(),
                    version = %header.version_or_empty(),
                    message_id = %header.message_id.as_deref().unwrap_or(""),
                    key_id = %header.key_id.as_deref().unwrap_or(""),
                    class = %e.response_class(),
                    error = %e,
                    "message failed"
                );
                Err(e)
            }
        }
    }
}
