//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::IngestError;
use crate::domain::outcome::HandlerReport;
use async_trait::async_trait;
use shared_types::Envelope;

/// Entry point for the transport layer.
#[async_trait]
pub trait EventIngestApi: Send + Sync {
    /// Process one raw envelope (JSON bytes) to completion.
    async fn ingest_raw(&self, raw: &[u8]) -> Result<HandlerReport, IngestError>;

    /// Process one parsed envelope to completion.
    async fn ingest(&self, envelope: &Envelope) -> Result<HandlerReport, IngestError>;
}
