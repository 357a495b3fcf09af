//! # Envelope Signature Check
//!
//! The signer signs the canonical string
//!
//! ```text
//! MessageType \n MessageId \n TimeStamp \n Body \n
//! ```
//!
//! (each element followed by a newline, no spaces) with RSA over the
//! configured digest. The signing certificate is fetched from the header's
//! `SigningCertURL`.

use crate::domain::errors::SignatureError;
use crate::ports::outbound::CertificateFetcher;
use shared_crypto::{decode_base64, SignatureDigest, SigningCertificate};
use shared_types::{Envelope, HeaderField};
use std::sync::Arc;
use tracing::{debug, warn};

/// Canonical signing string for an envelope.
pub fn canonical_signing_string(envelope: &Envelope) -> Result<String, SignatureError> {
    let header = &envelope.header;
    let message_type = header.require(HeaderField::MessageType)?;
    let message_id = header.require(HeaderField::MessageId)?;
    let timestamp = header.require(HeaderField::TimeStamp)?;

    Ok(format!(
        "{message_type}\n{message_id}\n{timestamp}\n{}\n",
        envelope.body
    ))
}

pub struct SignatureVerifier {
    certificates: Arc<dyn CertificateFetcher>,
    digest: SignatureDigest,
}

impl SignatureVerifier {
    pub fn new(certificates: Arc<dyn CertificateFetcher>, digest: SignatureDigest) -> Self {
        Self {
            certificates,
            digest,
        }
    }

    /// Verify the envelope signature against its signing certificate.
    pub async fn verify(&self, envelope: &Envelope) -> Result<(), SignatureError> {
        let header = &envelope.header;
        let signing_string = canonical_signing_string(envelope)?;
        let cert_url = header.require(HeaderField::SigningCertUrl)?;
        let signature = decode_base64("Signature", header.require(HeaderField::Signature)?)?;

        let document = self.certificates.fetch_certificate(cert_url).await?;
        let certificate = SigningCertificate::from_pem(&document)?;

        match certificate.verify(self.digest, signing_string.as_bytes(), &signature) {
            Ok(()) => {
                debug!(message_id = header.message_id.as_deref(), "signature verified");
                Ok(())
            }
            Err(e) => {
                warn!(
                    message_id = header.message_id.as_deref(),
                    cert_url,
                    "envelope signature rejected"
                );
                Err(e.into())
            }
        }
    }
}
