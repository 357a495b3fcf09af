//! # Activity Log Subsystem (EC-02)
//!
//! Minute-granularity counters of successfully processed events, one series
//! per category, used by an external monitor to detect ingestion silence.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): buckets, sample ranges, report shape, config
//! - **Ports** (`ports`): `ActivityStore`, the shared counter store
//! - **Service** (`service`): `ActivityLog` record + report
//! - **Adapters** (`adapters`): `InMemoryActivityStore`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryActivityStore;
pub use domain::config::ActivityConfig;
pub use domain::entities::{
    minute_of, minute_to_rfc3339, parse_timestamp, ActivityBucket, ActivityReport,
    BucketRecord, CategorySeries, SampleRange,
};
pub use domain::errors::ActivityError;
pub use ports::ActivityStore;
pub use service::{parse_categories, ActivityLog};
