//! Envelope parsing errors.

use crate::envelope::HeaderField;
use thiserror::Error;

/// Errors raised while reading a raw envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The input was not a structured envelope at all.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// A header field required by the current step is absent.
    #[error("Missing header field: {0}")]
    MissingField(HeaderField),

    /// Unknown event category name.
    #[error("Unknown event category: {0}")]
    UnknownCategory(String),
}
