//! # Event Extractor
//!
//! Decrypts an envelope body and parses it into a JSON payload.
//!
//! ## Stale Current Key
//!
//! When the key came from the cached current slot and the plaintext fails
//! the structural sniff (or the padding is invalid), the cached entry is
//! invalidated and the current key is fetched once more. Decryption is
//! retried exactly once; whatever that produces is final.

use crate::domain::entities::{ExtractedPayload, ResolvedKey};
use crate::domain::errors::ExtractionError;
use crate::domain::framing::{looks_like_json_object, strip_framing};
use crate::service::key_provider::KeyProvider;
use shared_crypto::{decode_base64, decrypt, CryptoError, Iv};
use shared_types::{Envelope, EnvelopeHeader, HeaderField};
use tracing::{error, warn};

/// Only supported body encoding.
pub const ENCODING_BASE64: &str = "base64";

/// Only supported cipher; also the default when `Algorithm` is absent.
pub const ALGORITHM_AES128CBC: &str = "aes128cbc";

pub struct EventExtractor {
    keys: KeyProvider,
}

impl EventExtractor {
    pub fn new(keys: KeyProvider) -> Self {
        Self { keys }
    }

    /// Decrypt and parse the body of `envelope`.
    pub async fn extract(&self, envelope: &Envelope) -> Result<ExtractedPayload, ExtractionError> {
        let result = self.extract_inner(envelope).await;
        if let Err(ExtractionError::MissingField(field)) = &result {
            error!(%field, header = ?envelope.header, "envelope is missing a required field");
        }
        result
    }

    async fn extract_inner(&self, envelope: &Envelope) -> Result<ExtractedPayload, ExtractionError> {
        let header = &envelope.header;
        check_encoding(header)?;
        check_algorithm(header)?;

        let iv = Iv::from_base64(header.require(HeaderField::Iv)?)?;
        let ciphertext = decode_base64("Body", &envelope.body)?;
        let resolution = self.keys.resolve(header).await?;

        let plaintext = match decrypt_text(&resolution.key, &iv, &ciphertext) {
            Ok(text) if looks_like_json_object(&text) => text,
            _ if resolution.source.is_cached_current() => {
                let message_type = header.require(HeaderField::MessageType)?;
                warn!(
                    message_type,
                    key_id = resolution.key.id(),
                    "cached current key did not yield readable plaintext"
                );
                let fresh = self.keys.refresh_current(message_type).await?;
                decrypt_text(&fresh, &iv, &ciphertext)?
            }
            Ok(text) => text,
            Err(e) => return Err(e.into()),
        };

        parse_payload(&plaintext)
    }
}

fn check_encoding(header: &EnvelopeHeader) -> Result<(), ExtractionError> {
    let encoding = header.require(HeaderField::Encoding)?;
    if encoding.eq_ignore_ascii_case(ENCODING_BASE64) {
        Ok(())
    } else {
        Err(ExtractionError::UnsupportedEncoding(encoding.to_string()))
    }
}

fn check_algorithm(header: &EnvelopeHeader) -> Result<(), ExtractionError> {
    match header.algorithm.as_deref() {
        None => Ok(()),
        Some(a) if a.eq_ignore_ascii_case(ALGORITHM_AES128CBC) => Ok(()),
        Some(other) => Err(ExtractionError::UnsupportedAlgorithm(other.to_string())),
    }
}

fn decrypt_text(key: &ResolvedKey, iv: &Iv, ciphertext: &[u8]) -> Result<String, CryptoError> {
    let plaintext = decrypt(&key.secret_key()?, iv, ciphertext)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::DecryptionFailed("plaintext is not UTF-8".to_string()))
}

fn parse_payload(plaintext: &str) -> Result<ExtractedPayload, ExtractionError> {
    let json = strip_framing(plaintext)
        .ok_or_else(|| ExtractionError::CannotParse("no JSON object in plaintext".to_string()))?;
    serde_json::from_str(json)
        .map(ExtractedPayload::new)
        .map_err(|e| ExtractionError::CannotParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryKeyCache, StaticKeyService};
    use crate::domain::entities::CacheKey;
    use crate::ports::outbound::KeyCache;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::json;
    use shared_crypto::{encrypt, SecretKey};
    use std::sync::Arc;

    const OLD_SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZg=="; // 0123456789abcdef
    const NEW_SECRET: &str = "ZmVkY2JhOTg3NjU0MzIxMA=="; // fedcba9876543210
    const IV_B64: &str = "BwcHBwcHBwcHBwcHBwcHBw==";
    const PERSON: &str = "uw-person-change-v1";

    /// Cache wrapper counting invalidations.
    #[derive(Default)]
    struct CountingCache {
        inner: InMemoryKeyCache,
        invalidated: Mutex<Vec<CacheKey>>,
    }

    impl KeyCache for CountingCache {
        fn get(&self, key: &CacheKey) -> Option<ResolvedKey> {
            self.inner.get(key)
        }
        fn set(&self, key: CacheKey, value: ResolvedKey) {
            self.inner.set(key, value)
        }
        fn invalidate(&self, key: &CacheKey) {
            self.invalidated.lock().push(key.clone());
            self.inner.invalidate(key)
        }
    }

    fn seal(secret_b64: &str, plaintext: &str) -> String {
        let key = SecretKey::from_base64(secret_b64).unwrap();
        let iv = Iv::from_base64(IV_B64).unwrap();
        STANDARD.encode(encrypt(&key, &iv, plaintext.as_bytes()))
    }

    fn envelope(body: String) -> Envelope {
        Envelope::new(
            EnvelopeHeader {
                message_type: Some(PERSON.into()),
                encoding: Some("base64".into()),
                iv: Some(IV_B64.into()),
                ..Default::default()
            },
            body,
        )
    }

    fn extractor() -> (EventExtractor, Arc<StaticKeyService>, Arc<CountingCache>) {
        let service = Arc::new(StaticKeyService::new());
        let cache = Arc::new(CountingCache::default());
        let extractor = EventExtractor::new(KeyProvider::new(service.clone(), cache.clone()));
        (extractor, service, cache)
    }

    #[tokio::test]
    async fn test_extracts_with_framing() {
        let (extractor, service, _) = extractor();
        service.set_current(PERSON, ResolvedKey::new("k1", OLD_SECRET));

        let body = seal(OLD_SECRET, "\u{1}\u{1}{\"Current\":{\"RegID\":\"ABC\"}}\u{0}");
        let payload = extractor.extract(&envelope(body)).await.unwrap();

        assert_eq!(payload.value(), &json!({"Current": {"RegID": "ABC"}}));
    }

    #[tokio::test]
    async fn test_key_id_path() {
        let (extractor, service, cache) = extractor();
        service.insert(ResolvedKey::new("k7", OLD_SECRET));
        let mut envelope = envelope(seal(OLD_SECRET, "{\"a\":1}"));
        envelope.header.key_id = Some("k7".into());

        assert_eq!(extractor.extract(&envelope).await.unwrap().value(), &json!({"a": 1}));
        assert!(cache.invalidated.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stale_cached_current_key_refreshed_once() {
        let (extractor, service, cache) = extractor();
        service.set_current(PERSON, ResolvedKey::new("old", OLD_SECRET));
        extractor
            .extract(&envelope(seal(OLD_SECRET, "{\"warm\":true}")))
            .await
            .unwrap();
        let lookups_before = service.lookups();

        service.set_current(PERSON, ResolvedKey::new("new", NEW_SECRET));
        let payload = extractor
            .extract(&envelope(seal(NEW_SECRET, "{\"rotated\":true}")))
            .await
            .unwrap();

        assert_eq!(payload.value(), &json!({"rotated": true}));
        assert_eq!(
            *cache.invalidated.lock(),
            vec![CacheKey::Current(PERSON.into())]
        );
        assert_eq!(service.lookups(), lookups_before + 1);
    }

    #[tokio::test]
    async fn test_uncached_bad_plaintext_not_retried() {
        let (extractor, service, cache) = extractor();
        service.set_current(PERSON, ResolvedKey::new("k1", OLD_SECRET));

        let result = extractor
            .extract(&envelope(seal(OLD_SECRET, "not json at all")))
            .await;

        assert!(matches!(result, Err(ExtractionError::CannotParse(_))));
        assert!(cache.invalidated.lock().is_empty());
        assert_eq!(service.lookups(), 1);
    }

    #[tokio::test]
    async fn test_retry_happens_only_once() {
        let (extractor, service, cache) = extractor();
        service.set_current(PERSON, ResolvedKey::new("k1", OLD_SECRET));
        extractor
            .extract(&envelope(seal(OLD_SECRET, "{}")))
            .await
            .unwrap();

        let result = extractor
            .extract(&envelope(seal(OLD_SECRET, "garbage")))
            .await;

        assert!(matches!(result, Err(ExtractionError::CannotParse(_))));
        assert_eq!(cache.invalidated.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_non_base64_encoding_rejected() {
        let (extractor, _, _) = extractor();
        let mut envelope = envelope(String::new());
        envelope.header.encoding = Some("hex".into());

        assert_eq!(
            extractor.extract(&envelope).await,
            Err(ExtractionError::UnsupportedEncoding("hex".into()))
        );
    }

    #[tokio::test]
    async fn test_unknown_algorithm_rejected() {
        let (extractor, _, _) = extractor();
        let mut envelope = envelope(String::new());
        envelope.header.algorithm = Some("aes256gcm".into());

        assert!(matches!(
            extractor.extract(&envelope).await,
            Err(ExtractionError::UnsupportedAlgorithm(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_iv_reported_by_name() {
        let (extractor, _, _) = extractor();
        let mut envelope = envelope(String::new());
        envelope.header.iv = None;

        assert_eq!(
            extractor.extract(&envelope).await,
            Err(ExtractionError::MissingField(HeaderField::Iv))
        );
    }

    proptest! {
        #[test]
        fn prop_roundtrip_recovers_object(
            name in "[A-Za-z0-9 ]{0,40}",
            count in any::<i32>(),
            prefix in "[\\x00-\\x08]{0,4}",
            suffix in "[\\x00-\\x08]{0,4}",
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (extractor, service, _) = extractor();
            service.set_current(PERSON, ResolvedKey::new("k1", OLD_SECRET));

            let object = json!({"name": name, "count": count});
            let framed = format!("{prefix}{object}{suffix}");
            let payload = runtime
                .block_on(extractor.extract(&envelope(seal(OLD_SECRET, &framed))))
                .unwrap();

            prop_assert_eq!(payload.into_value(), object);
        }
    }
}
