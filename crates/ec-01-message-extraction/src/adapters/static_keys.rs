//! Fixed key and certificate sources.
//!
//! Used by tests and by offline replay, where envelopes are decrypted with
//! keys exported ahead of time instead of fetched from the key service.

use crate::domain::entities::ResolvedKey;
use crate::ports::outbound::{
    CertificateFetchError, CertificateFetcher, KeyService, KeyServiceError,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `KeyService` answering from in-memory tables.
///
/// Counts upstream lookups so callers can assert cache behaviour.
#[derive(Debug, Default)]
pub struct StaticKeyService {
    by_id: RwLock<HashMap<String, ResolvedKey>>,
    current: RwLock<HashMap<String, ResolvedKey>>,
    by_url: RwLock<HashMap<String, ResolvedKey>>,
    lookups: AtomicUsize,
}

impl StaticKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key by id.
    pub fn insert(&self, key: ResolvedKey) {
        self.by_id.write().insert(key.id().to_string(), key);
    }

    /// Make `key` the current key for `message_type` (rotation).
    pub fn set_current(&self, message_type: &str, key: ResolvedKey) {
        self.by_id.write().insert(key.id().to_string(), key.clone());
        self.current.write().insert(message_type.to_string(), key);
    }

    /// Serve `key` at an absolute URL.
    pub fn insert_url(&self, url: &str, key: ResolvedKey) {
        self.by_url.write().insert(url.to_string(), key);
    }

    /// Number of upstream lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn answer(
        &self,
        table: &RwLock<HashMap<String, ResolvedKey>>,
        name: &str,
    ) -> Result<ResolvedKey, KeyServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        table
            .read()
            .get(name)
            .cloned()
            .ok_or(KeyServiceError::NotFound { status: 404 })
    }
}

#[async_trait]
impl KeyService for StaticKeyService {
    async fn key_by_id(&self, key_id: &str) -> Result<ResolvedKey, KeyServiceError> {
        self.answer(&self.by_id, key_id)
    }

    async fn current_key(&self, message_type: &str) -> Result<ResolvedKey, KeyServiceError> {
        self.answer(&self.current, message_type)
    }

    async fn key_by_url(&self, url: &str) -> Result<ResolvedKey, KeyServiceError> {
        self.answer(&self.by_url, url)
    }
}

/// `CertificateFetcher` serving PEM documents from memory.
#[derive(Debug, Default)]
pub struct StaticCertificates {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl StaticCertificates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, pem: impl Into<Vec<u8>>) {
        self.documents.write().insert(url.to_string(), pem.into());
    }
}

#[async_trait]
impl CertificateFetcher for StaticCertificates {
    async fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, CertificateFetchError> {
        self.documents
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| CertificateFetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
