//! # Extraction Entities
//!
//! Resolved keys, where they came from, and the decrypted payload.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_crypto::{CryptoError, SecretKey};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A symmetric key document returned by the key service.
///
/// The secret is kept base64-encoded, exactly as delivered, and is wiped
/// when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ResolvedKey {
    id: String,
    secret: String,
}

impl ResolvedKey {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    /// Key identifier as reported by the key service.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Decode the secret into AES key material.
    pub fn secret_key(&self) -> Result<SecretKey, CryptoError> {
        SecretKey::from_base64(&self.secret)
    }
}

impl fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Cache slot for a resolved key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Key looked up by its identifier.
    ById(String),
    /// The current key for a message type.
    Current(String),
}

/// How a key was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Fetched from the header's key URL. Never cached.
    Url,
    /// Looked up by the header's key id.
    Id { cached: bool },
    /// Current key for the message type.
    Current { cached: bool },
}

impl KeySource {
    /// A cached current key may have been rotated upstream since it was stored.
    pub fn is_cached_current(&self) -> bool {
        matches!(self, KeySource::Current { cached: true })
    }
}

/// Result of key resolution.
#[derive(Debug, Clone)]
pub struct KeyResolution {
    pub key: ResolvedKey,
    pub source: KeySource,
}

/// Decrypted and parsed event body.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPayload {
    value: Value,
}

impl ExtractedPayload {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deserialize the payload into a typed event body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

impl From<Value> for ExtractedPayload {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let key = ResolvedKey::new("k1", "MDEyMzQ1Njc4OWFiY2RlZg==");
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("k1"));
        assert!(!rendered.contains("MDEy"));
    }

    #[test]
    fn test_secret_key_decodes() {
        let key = ResolvedKey::new("k1", "MDEyMzQ1Njc4OWFiY2RlZg==");
        assert_eq!(key.secret_key().unwrap().as_bytes(), b"0123456789abcdef");
    }

    #[test]
    fn test_only_cached_current_is_stale_candidate() {
        assert!(KeySource::Current { cached: true }.is_cached_current());
        assert!(!KeySource::Current { cached: false }.is_cached_current());
        assert!(!KeySource::Id { cached: true }.is_cached_current());
        assert!(!KeySource::Url.is_cached_current());
    }
}
