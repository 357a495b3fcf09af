//! # Outbound Ports (Driven Ports / SPI)
//!
//! Key service, key cache and certificate retrieval.

use crate::domain::entities::{CacheKey, ResolvedKey};
use async_trait::async_trait;
use thiserror::Error;

/// Error from the key service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyServiceError {
    /// The service has no such key.
    #[error("Key not found (status {status})")]
    NotFound { status: u16 },

    /// Request could not be completed.
    #[error("Key service request failed: {0}")]
    Transport(String),

    /// The response was not a key document.
    #[error("Malformed key document: {0}")]
    Malformed(String),
}

/// Error retrieving a signing certificate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertificateFetchError {
    #[error("certificate request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("certificate request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Remote key service.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Key by identifier.
    async fn key_by_id(&self, key_id: &str) -> Result<ResolvedKey, KeyServiceError>;

    /// Current key for a message type.
    async fn current_key(&self, message_type: &str) -> Result<ResolvedKey, KeyServiceError>;

    /// Key at an absolute URL taken from the envelope header.
    async fn key_by_url(&self, url: &str) -> Result<ResolvedKey, KeyServiceError>;
}

/// Process-wide key cache.
///
/// Implementations must be safe for concurrent readers.
pub trait KeyCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<ResolvedKey>;

    fn set(&self, key: CacheKey, value: ResolvedKey);

    fn invalidate(&self, key: &CacheKey);
}

/// Retrieval of signing certificates by URL.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// PEM document at `url`.
    async fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, CertificateFetchError>;
}
