//! Service layer: wires key resolution, signature checking and decryption
//! behind the `MessageExtractionApi` port.

pub mod extractor;
pub mod key_provider;
pub mod signature;

pub use extractor::EventExtractor;
pub use key_provider::KeyProvider;
pub use signature::{canonical_signing_string, SignatureVerifier};

use crate::domain::config::ExtractionConfig;
use crate::domain::entities::ExtractedPayload;
use crate::domain::errors::{ExtractionError, SignatureError};
use crate::ports::inbound::MessageExtractionApi;
use crate::ports::outbound::{CertificateFetcher, KeyCache, KeyService};
use async_trait::async_trait;
use shared_types::Envelope;
use std::sync::Arc;

/// Message extraction service.
pub struct MessageExtractionService {
    config: ExtractionConfig,
    verifier: SignatureVerifier,
    extractor: EventExtractor,
}

impl MessageExtractionService {
    pub fn new(
        config: ExtractionConfig,
        keys: Arc<dyn KeyService>,
        cache: Arc<dyn KeyCache>,
        certificates: Arc<dyn CertificateFetcher>,
    ) -> Self {
        Self {
            verifier: SignatureVerifier::new(certificates, config.digest),
            extractor: EventExtractor::new(KeyProvider::new(keys, cache)),
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }
}

#[async_trait]
impl MessageExtractionApi for MessageExtractionService {
    async fn authenticate(&self, envelope: &Envelope) -> Result<(), SignatureError> {
        if !self.config.validate_signature {
            return Ok(());
        }
        self.verifier.verify(envelope).await
    }

    async fn extract(&self, envelope: &Envelope) -> Result<ExtractedPayload, ExtractionError> {
        self.extractor.extract(envelope).await
    }
}
