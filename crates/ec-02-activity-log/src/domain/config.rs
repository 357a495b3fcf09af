//! Activity log configuration.

/// Retention settings for activity buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityConfig {
    /// Buckets older than this many days are eligible for pruning.
    pub prune_after_days: u32,
    /// Pruning runs only while the bucket just written holds at most this many events.
    pub prune_trigger_max: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            prune_after_days: 7,
            prune_trigger_max: 5,
        }
    }
}

impl ActivityConfig {
    pub fn with_prune_after_days(mut self, days: u32) -> Self {
        self.prune_after_days = days;
        self
    }

    /// Retention window in minutes.
    pub fn retention_minutes(&self) -> i64 {
        i64::from(self.prune_after_days) * crate::domain::entities::MINUTES_PER_DAY
    }

    /// Widest health report window, in minutes. Older buckets are pruned.
    pub fn max_report_minutes(&self) -> i64 {
        self.retention_minutes() + 1
    }
}
