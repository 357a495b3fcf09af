//! In-process key cache.

use crate::domain::entities::{CacheKey, ResolvedKey};
use crate::ports::outbound::KeyCache;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// `KeyCache` backed by a read-write locked map.
///
/// Entries live until invalidated; key rotation is detected by the
/// extractor, which invalidates the stale current key.
#[derive(Debug, Default)]
pub struct InMemoryKeyCache {
    entries: RwLock<HashMap<CacheKey, ResolvedKey>>,
}

impl InMemoryKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyCache for InMemoryKeyCache {
    fn get(&self, key: &CacheKey) -> Option<ResolvedKey> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: CacheKey, value: ResolvedKey) {
        debug!(cache_key = ?key, key_id = value.id(), "caching key");
        self.entries.write().insert(key, value);
    }

    fn invalidate(&self, key: &CacheKey) {
        if self.entries.write().remove(key).is_some() {
            debug!(cache_key = ?key, "invalidated cached key");
        }
    }
}
