//! In-memory activity store.

use crate::domain::entities::ActivityBucket;
use crate::domain::errors::ActivityError;
use crate::ports::ActivityStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::EventCategory;
use std::collections::BTreeMap;

/// `ActivityStore` holding buckets in a single locked ordered map.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    buckets: Mutex<BTreeMap<(EventCategory, i64), u64>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count in one bucket, 0 when absent.
    pub fn count(&self, category: EventCategory, minute: i64) -> u64 {
        self.buckets
            .lock()
            .get(&(category, minute))
            .copied()
            .unwrap_or(0)
    }

    /// Number of buckets held for `category`.
    pub fn bucket_count(&self, category: EventCategory) -> usize {
        self.buckets
            .lock()
            .keys()
            .filter(|(c, _)| *c == category)
            .count()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn increment(
        &self,
        category: EventCategory,
        minute: i64,
        by: u64,
    ) -> Result<u64, ActivityError> {
        let mut buckets = self.buckets.lock();
        let count = buckets.entry((category, minute)).or_insert(0);
        *count = count.saturating_add(by);
        Ok(*count)
    }

    async fn prune_before(
        &self,
        category: EventCategory,
        before: i64,
    ) -> Result<usize, ActivityError> {
        let mut buckets = self.buckets.lock();
        let size = buckets.len();
        buckets.retain(|(c, minute), _| *c != category || *minute >= before);
        Ok(size - buckets.len())
    }

    async fn range(
        &self,
        category: EventCategory,
        start: i64,
        end: i64,
    ) -> Result<Vec<ActivityBucket>, ActivityError> {
        if start > end {
            return Ok(Vec::new());
        }
        let buckets = self.buckets.lock();
        Ok(buckets
            .range((category, start)..=(category, end))
            .map(|(&(_, minute), &count)| ActivityBucket { minute, count })
            .collect())
    }
}
