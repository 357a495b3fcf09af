//! # Activity Log Service
//!
//! Records successful event processing per category and minute, and answers
//! health queries over the recorded buckets.
//!
//! Pruning is opportunistic: after an increment, if the bucket just written
//! holds at most `prune_trigger_max` events, buckets older than the retention
//! window are deleted. A busy minute (count above the threshold) skips the
//! prune, so bursts never pay for it.

use crate::domain::config::ActivityConfig;
use crate::domain::entities::{minute_to_rfc3339, ActivityReport, CategorySeries, SampleRange};
use crate::domain::errors::ActivityError;
use crate::ports::ActivityStore;
use shared_types::{EventCategory, TimeSource};
use std::sync::Arc;
use tracing::{debug, trace};

pub struct ActivityLog {
    store: Arc<dyn ActivityStore>,
    time: Arc<dyn TimeSource>,
    config: ActivityConfig,
}

impl ActivityLog {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        time: Arc<dyn TimeSource>,
        config: ActivityConfig,
    ) -> Self {
        Self {
            store,
            time,
            config,
        }
    }

    /// Add `count` processed events to the current minute of `category`.
    ///
    /// Returns the bucket total after the increment.
    pub async fn record_success(
        &self,
        category: EventCategory,
        count: u64,
    ) -> Result<u64, ActivityError> {
        let minute = self.time.current_minute();
        let total = self.store.increment(category, minute, count).await?;
        trace!(%category, minute, total, "activity recorded");

        if total <= self.config.prune_trigger_max {
            let cutoff = minute - self.config.retention_minutes();
            let pruned = self.store.prune_before(category, cutoff).await?;
            if pruned > 0 {
                debug!(%category, cutoff, pruned, "pruned stale activity buckets");
            }
        }

        Ok(total)
    }

    /// Event counts per category over `range`, one point per minute.
    pub async fn report(
        &self,
        categories: &[EventCategory],
        range: SampleRange,
    ) -> Result<ActivityReport, ActivityError> {
        let (start, end) = range.minutes(self.time.current_minute());
        let minutes = end.saturating_sub(start).saturating_add(1);
        let max = self.config.max_report_minutes();
        if minutes > max {
            return Err(ActivityError::RangeTooWide { minutes, max });
        }
        let width = usize::try_from(minutes)
            .map_err(|_| ActivityError::RangeTooWide { minutes, max })?;

        let mut report = ActivityReport::new();
        for &category in categories {
            let mut points = vec![0u64; width];
            for bucket in self.store.range(category, start, end).await? {
                if let Some(slot) = usize::try_from(bucket.minute - start)
                    .ok()
                    .and_then(|i| points.get_mut(i))
                {
                    *slot = bucket.count;
                }
            }
            report.insert(
                category,
                CategorySeries {
                    start: minute_to_rfc3339(start),
                    end: minute_to_rfc3339(end),
                    points,
                },
            );
        }
        Ok(report)
    }
}

/// Parse a comma-separated category list (`enrollment,group`).
pub fn parse_categories(csv: &str) -> Result<Vec<EventCategory>, ActivityError> {
    csv.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            name.parse::<EventCategory>()
                .map_err(|_| ActivityError::UnknownCategory(name.trim().to_string()))
        })
        .collect()
}
