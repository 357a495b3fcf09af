//! # Activity Entities

use crate::domain::errors::ActivityError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared_types::EventCategory;
use std::collections::BTreeMap;

/// Minutes in a day, for retention arithmetic.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Count of processed events for one category in one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityBucket {
    pub minute: i64,
    pub count: u64,
}

/// A bucket together with its category, as exported from a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRecord {
    pub category: EventCategory,
    pub minute: i64,
    pub count: u64,
}

/// Minute index (`unix seconds / 60`, floored) of a UTC time.
pub fn minute_of(time: &DateTime<Utc>) -> i64 {
    time.timestamp().div_euclid(60)
}

/// Start of a minute as RFC 3339 UTC (`2024-03-01T10:15:00Z`).
pub fn minute_to_rfc3339(minute: i64) -> String {
    Utc.timestamp_opt(minute * 60, 0)
        .single()
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ActivityError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ActivityError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Time window of a health query, at one-minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRange {
    /// The current minute.
    Now,
    /// A single minute.
    On(DateTime<Utc>),
    /// From `begin` to `end` inclusive; `end` defaults to now.
    Between {
        begin: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    },
}

impl SampleRange {
    /// Build a range from query-style parameters. `on` wins over `begin`/`end`;
    /// `end` without `begin` is ignored.
    pub fn from_query(
        on: Option<&str>,
        begin: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, ActivityError> {
        if let Some(on) = on {
            return Ok(SampleRange::On(parse_timestamp(on)?));
        }
        match begin {
            Some(begin) => Ok(SampleRange::Between {
                begin: parse_timestamp(begin)?,
                end: end.map(parse_timestamp).transpose()?,
            }),
            None => Ok(SampleRange::Now),
        }
    }

    /// Inclusive `(start, end)` minute indexes, `start <= end`.
    pub fn minutes(&self, now_minute: i64) -> (i64, i64) {
        let (start, end) = match self {
            SampleRange::Now => (now_minute, now_minute),
            SampleRange::On(t) => (minute_of(t), minute_of(t)),
            SampleRange::Between { begin, end } => {
                (minute_of(begin), end.as_ref().map_or(now_minute, minute_of))
            }
        };
        if start > end {
            (end, start)
        } else {
            (start, end)
        }
    }
}

/// Event counts of one category across a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySeries {
    pub start: String,
    pub end: String,
    /// One entry per minute, oldest first; minutes without events are 0.
    pub points: Vec<u64>,
}

/// Health report keyed by category.
pub type ActivityReport = BTreeMap<EventCategory, CategorySeries>;
