//! Time source abstraction.
//!
//! Abstracted to allow testing with deterministic time.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Seconds-resolution wall clock.
pub trait TimeSource: Send + Sync {
    /// Current Unix time in seconds.
    fn now_secs(&self) -> u64;

    /// Current time as a UTC datetime.
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.now_secs() as i64, 0)
            .single()
            .unwrap_or_default()
    }

    /// Minute index (`now / 60`, floored) used by activity buckets.
    fn current_minute(&self) -> i64 {
        (self.now_secs() / 60) as i64
    }
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable time source for tests and replays.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    secs: AtomicU64,
}

impl FixedTimeSource {
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }
}
