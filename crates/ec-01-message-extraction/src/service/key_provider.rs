//! # Key Provider
//!
//! Resolves the decryption key for an envelope.
//!
//! Lookup order:
//! 1. `KeyURL` present: fetch from that URL. Not cached.
//! 2. `KeyId` present: cache first, then the key service by id.
//! 3. Otherwise: the current key for the message type, cache first.
//!
//! A key obtained from the cached current slot is reported as such so the
//! extractor can refresh it once if upstream has rotated.

use crate::domain::entities::{CacheKey, KeyResolution, KeySource, ResolvedKey};
use crate::domain::errors::{ExtractionError, KeyResolutionError};
use crate::ports::outbound::{KeyCache, KeyService};
use shared_types::{EnvelopeHeader, HeaderField};
use std::sync::Arc;
use tracing::{debug, info};

pub struct KeyProvider {
    service: Arc<dyn KeyService>,
    cache: Arc<dyn KeyCache>,
}

impl KeyProvider {
    pub fn new(service: Arc<dyn KeyService>, cache: Arc<dyn KeyCache>) -> Self {
        Self { service, cache }
    }

    /// Resolve the key an envelope was encrypted with.
    pub async fn resolve(&self, header: &EnvelopeHeader) -> Result<KeyResolution, ExtractionError> {
        if let Some(url) = header.key_url.as_deref() {
            debug!(key_url = url, "resolving key by URL");
            let key = self
                .service
                .key_by_url(url)
                .await
                .map_err(|source| KeyResolutionError {
                    lookup: format!("url {url}"),
                    source,
                })?;
            return Ok(KeyResolution {
                key,
                source: KeySource::Url,
            });
        }

        if let Some(key_id) = header.key_id.as_deref() {
            let slot = CacheKey::ById(key_id.to_string());
            if let Some(key) = self.cache.get(&slot) {
                return Ok(KeyResolution {
                    key,
                    source: KeySource::Id { cached: true },
                });
            }
            let key = self
                .service
                .key_by_id(key_id)
                .await
                .map_err(|source| KeyResolutionError {
                    lookup: format!("id {key_id}"),
                    source,
                })?;
            self.cache.set(slot, key.clone());
            return Ok(KeyResolution {
                key,
                source: KeySource::Id { cached: false },
            });
        }

        let message_type = header.require(HeaderField::MessageType)?;
        if let Some(key) = self.cache.get(&CacheKey::Current(message_type.to_string())) {
            return Ok(KeyResolution {
                key,
                source: KeySource::Current { cached: true },
            });
        }
        let key = self.fetch_current(message_type).await?;
        Ok(KeyResolution {
            key,
            source: KeySource::Current { cached: false },
        })
    }

    /// Drop the cached current key for `message_type` and fetch it again.
    pub async fn refresh_current(&self, message_type: &str) -> Result<ResolvedKey, KeyResolutionError> {
        info!(message_type, "refreshing current key");
        self.cache
            .invalidate(&CacheKey::Current(message_type.to_string()));
        self.fetch_current(message_type).await
    }

    async fn fetch_current(&self, message_type: &str) -> Result<ResolvedKey, KeyResolutionError> {
        let key = self
            .service
            .current_key(message_type)
            .await
            .map_err(|source| KeyResolutionError {
                lookup: format!("current {message_type}"),
                source,
            })?;
        self.cache
            .set(CacheKey::Current(message_type.to_string()), key.clone());
        self.cache
            .set(CacheKey::ById(key.id().to_string()), key.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryKeyCache, StaticKeyService};
    use crate::ports::outbound::KeyServiceError;

    fn provider() -> (KeyProvider, Arc<StaticKeyService>, Arc<InMemoryKeyCache>) {
        let service = Arc::new(StaticKeyService::new());
        let cache = Arc::new(InMemoryKeyCache::new());
        (
            KeyProvider::new(service.clone(), cache.clone()),
            service,
            cache,
        )
    }

    fn header() -> EnvelopeHeader {
        EnvelopeHeader {
            message_type: Some("uw-person-change-v1".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_url_wins_and_is_not_cached() {
        let (provider, service, cache) = provider();
        service.insert_url("https://keys/k9", ResolvedKey::new("k9", "YQ=="));
        service.insert(ResolvedKey::new("k1", "Yg=="));

        let mut header = header();
        header.key_url = Some("https://keys/k9".into());
        header.key_id = Some("k1".into());

        let resolution = provider.resolve(&header).await.unwrap();
        assert_eq!(resolution.key.id(), "k9");
        assert_eq!(resolution.source, KeySource::Url);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_id_lookup_uses_cache_second_time() {
        let (provider, service, _cache) = provider();
        service.insert(ResolvedKey::new("k1", "YQ=="));
        let mut header = header();
        header.key_id = Some("k1".into());

        let first = provider.resolve(&header).await.unwrap();
        let second = provider.resolve(&header).await.unwrap();

        assert_eq!(first.source, KeySource::Id { cached: false });
        assert_eq!(second.source, KeySource::Id { cached: true });
        assert_eq!(service.lookups(), 1);
    }

    #[tokio::test]
    async fn test_current_key_cached_per_type() {
        let (provider, service, _cache) = provider();
        service.set_current("uw-person-change-v1", ResolvedKey::new("k1", "YQ=="));

        let first = provider.resolve(&header()).await.unwrap();
        let second = provider.resolve(&header()).await.unwrap();

        assert_eq!(first.source, KeySource::Current { cached: false });
        assert!(second.source.is_cached_current());
        assert_eq!(service.lookups(), 1);
    }

    #[tokio::test]
    async fn test_refresh_replaces_stale_current() {
        let (provider, service, cache) = provider();
        service.set_current("uw-person-change-v1", ResolvedKey::new("old", "YQ=="));
        provider.resolve(&header()).await.unwrap();

        service.set_current("uw-person-change-v1", ResolvedKey::new("new", "Yg=="));
        let refreshed = provider.refresh_current("uw-person-change-v1").await.unwrap();

        assert_eq!(refreshed.id(), "new");
        assert_eq!(
            cache
                .get(&CacheKey::Current("uw-person-change-v1".into()))
                .unwrap()
                .id(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_key_resolution_error() {
        let (provider, _service, _cache) = provider();
        let mut header = header();
        header.key_id = Some("missing".into());

        let err = provider.resolve(&header).await.unwrap_err();
        assert_eq!(
            err,
            ExtractionError::KeyResolution(KeyResolutionError {
                lookup: "id missing".into(),
                source: KeyServiceError::NotFound { status: 404 },
            })
        );
    }

    #[tokio::test]
    async fn test_no_type_no_id_no_url() {
        let (provider, _service, _cache) = provider();
        let err = provider.resolve(&EnvelopeHeader::default()).await.unwrap_err();
        assert_eq!(err, ExtractionError::MissingField(HeaderField::MessageType));
    }
}
