//! Activity log errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivityError {
    /// The counter store rejected an operation.
    #[error("Activity store error: {0}")]
    Store(String),

    #[error("Unknown event type {0}")]
    UnknownCategory(String),

    #[error("Invalid timestamp {value}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Sample range of {minutes} minutes exceeds the {max} minute limit")]
    RangeTooWide { minutes: i64, max: i64 },
}
