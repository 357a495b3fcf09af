//! Error types for the extraction subsystem.

use crate::ports::outbound::{CertificateFetchError, KeyServiceError};
use shared_crypto::CryptoError;
use shared_types::{EnvelopeError, HeaderField};
use thiserror::Error;

/// Envelope authentication failed.
///
/// Network and cryptographic failures are both reported through this one
/// type so the caller answers with a single authentication outcome; the
/// variant keeps the underlying category for diagnosis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// A header field needed for the signing string is absent.
    #[error("Signature check failed: missing header field {0}")]
    MissingField(HeaderField),

    /// The signing certificate could not be retrieved.
    #[error("Signature check failed: network: {0}")]
    CertificateFetch(#[from] CertificateFetchError),

    /// Certificate parsing, signature decoding or verification failed.
    #[error("Signature check failed: crypto: {0}")]
    Crypto(#[from] CryptoError),
}

/// The key service could not supply a key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Key resolution failed for {lookup}: {source}")]
pub struct KeyResolutionError {
    /// What was being looked up (`id k1`, `current uw-person-change-v1`, a URL).
    pub lookup: String,
    pub source: KeyServiceError,
}

/// The body could not be turned into a JSON payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unsupported body encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Unsupported cipher algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Missing header field: {0}")]
    MissingField(HeaderField),

    #[error(transparent)]
    KeyResolution(#[from] KeyResolutionError),

    #[error("Cannot decrypt body: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Cannot parse body: {0}")]
    CannotParse(String),
}

impl From<EnvelopeError> for ExtractionError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingField(field) => ExtractionError::MissingField(field),
            other => ExtractionError::CannotParse(other.to_string()),
        }
    }
}

impl From<EnvelopeError> for SignatureError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingField(field) => SignatureError::MissingField(field),
            other => SignatureError::Crypto(CryptoError::InvalidCertificate(other.to_string())),
        }
    }
}
