//! # Ports
//!
//! The counter store the activity log writes to. Several consumer processes
//! may share one store, so `increment` must be an atomic increment-or-create
//! on the store side.

use crate::domain::entities::ActivityBucket;
use crate::domain::errors::ActivityError;
use async_trait::async_trait;
use shared_types::EventCategory;

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Add `by` to the `(category, minute)` bucket, creating it if absent.
    /// Returns the bucket's new total.
    async fn increment(
        &self,
        category: EventCategory,
        minute: i64,
        by: u64,
    ) -> Result<u64, ActivityError>;

    /// Delete every bucket of `category` with `minute < before`.
    /// Returns how many were removed.
    async fn prune_before(
        &self,
        category: EventCategory,
        before: i64,
    ) -> Result<usize, ActivityError>;

    /// Buckets of `category` with `start <= minute <= end`, ascending.
    async fn range(
        &self,
        category: EventCategory,
        start: i64,
        end: i64,
    ) -> Result<Vec<ActivityBucket>, ActivityError>;
}
