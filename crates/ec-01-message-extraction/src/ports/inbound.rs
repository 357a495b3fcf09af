//! # Inbound Ports (Driving Ports / API)
//!
//! What the dispatch layer calls once an envelope has been routed.

use crate::domain::entities::ExtractedPayload;
use crate::domain::errors::{ExtractionError, SignatureError};
use async_trait::async_trait;
use shared_types::Envelope;

/// Primary message extraction API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait MessageExtractionApi: Send + Sync {
    /// Check the envelope signature.
    ///
    /// Returns `Ok(())` without any work when signature validation is
    /// disabled by configuration.
    async fn authenticate(&self, envelope: &Envelope) -> Result<(), SignatureError>;

    /// Decrypt and parse the body into a JSON payload.
    ///
    /// # Errors
    /// * `ExtractionError::UnsupportedEncoding` - encoding is not base64
    /// * `ExtractionError::MissingField` - a required header field is absent
    /// * `ExtractionError::KeyResolution` - no key could be obtained
    /// * `ExtractionError::CannotParse` - the plaintext is not a JSON object
    async fn extract(&self, envelope: &Envelope) -> Result<ExtractedPayload, ExtractionError>;
}
