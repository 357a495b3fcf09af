//! # Dispatch and Ingest Errors
//!
//! `IngestError` is the single failure type of the pipeline. Every variant
//! fails the whole current message; routine per-event skips are reported as
//! `SkipReason`s instead.

use crate::domain::policy::PolicyError;
use crate::ports::outbound::{LookupError, SinkError, StoreError};
use ec_01_message_extraction::{ExtractionError, SignatureError};
use ec_02_activity_log::ActivityError;
use shared_types::EnvelopeError;
use std::fmt;
use thiserror::Error;

/// No handler declares the envelope's (type, version) pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown message type {message_type:?} version {version:?}")]
pub struct UnknownMessageTypeError {
    pub message_type: String,
    pub version: String,
}

/// An action code no operation is mapped to. Never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown action {code:?} for {subject}")]
pub struct UnknownActionError {
    pub code: String,
    pub subject: String,
}

/// The downstream sink failed part-way through a batch.
///
/// Records before the failing one stay applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Load failed after {applied} of {submitted} records: {source}")]
pub struct LoadError {
    pub applied: usize,
    pub submitted: usize,
    pub source: SinkError,
}

/// Why a single event or action produced no update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownAction(UnknownActionError),
    /// The event did not have the expected shape.
    MalformedEvent(String),
    /// Time schedule for the section's campus is still being built.
    ScheduleUnderConstruction { campus: String, term: String },
    MissingNetId(String),
    Policy(PolicyError),
    /// Nested group lookup failed; that group was skipped.
    NestedGroup { group: String, reason: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownAction(e) => write!(f, "{e}"),
            SkipReason::MalformedEvent(reason) => write!(f, "malformed event: {reason}"),
            SkipReason::ScheduleUnderConstruction { campus, term } => {
                write!(f, "time schedule under construction for {campus} {term}")
            }
            SkipReason::MissingNetId(reg_id) => write!(f, "missing net id for {reg_id}"),
            SkipReason::Policy(e) => write!(f, "policy: {e}"),
            SkipReason::NestedGroup { group, reason } => {
                write!(f, "nested group {group}: {reason}")
            }
        }
    }
}

/// Response class at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    BadRequest,
    AuthenticationFailure,
    InternalError,
}

impl ResponseClass {
    pub fn status_code(&self) -> u16 {
        match self {
            ResponseClass::BadRequest => 400,
            ResponseClass::AuthenticationFailure => 401,
            ResponseClass::InternalError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseClass::BadRequest => "bad_request",
            ResponseClass::AuthenticationFailure => "authentication_failure",
            ResponseClass::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ResponseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Malformed(#[from] EnvelopeError),

    #[error(transparent)]
    UnknownMessageType(#[from] UnknownMessageTypeError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Decrypted payload does not have the shape the handler expects.
    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Record store: {0}")]
    Store(#[from] StoreError),

    #[error("Lookup: {0}")]
    Lookup(#[from] LookupError),

    #[error("Activity log: {0}")]
    Activity(#[from] ActivityError),
}

impl IngestError {
    /// How the transport should answer for this failure.
    pub fn response_class(&self) -> ResponseClass {
        match self {
            IngestError::Malformed(_)
            | IngestError::UnknownMessageType(_)
            | IngestError::Payload(_) => ResponseClass::BadRequest,
            IngestError::Signature(_) => ResponseClass::AuthenticationFailure,
            IngestError::Extraction(
                ExtractionError::KeyResolution(_) | ExtractionError::Crypto(_),
            ) => ResponseClass::AuthenticationFailure,
            IngestError::Extraction(_) => ResponseClass::BadRequest,
            IngestError::Load(_)
            | IngestError::Store(_)
            | IngestError::Lookup(_)
            | IngestError::Activity(_) => ResponseClass::InternalError,
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Payload(err.to_string())
    }
}
