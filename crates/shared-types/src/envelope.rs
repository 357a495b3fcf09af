//! # Inbound Envelope
//!
//! The logical shape of a change-event notification as delivered by the
//! upstream notification service.
//!
//! Two header casings are in circulation: the registration/person services
//! use `Header`/`MessageType`/`TimeStamp`, the group service uses
//! `header`/`messageType`/`timestamp`. Both deserialize into the same
//! `EnvelopeHeader`.
//!
//! Every header field is optional at the parsing layer. Whether a field is
//! required depends on the processing step, so callers use
//! [`EnvelopeHeader::require`] which reports the missing field by name.

use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header fields that processing steps may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    MessageType,
    Version,
    MessageId,
    TimeStamp,
    Encoding,
    Algorithm,
    KeyId,
    KeyUrl,
    Iv,
    SigningCertUrl,
    Signature,
    MessageContext,
}

impl HeaderField {
    /// Wire name of the field (registration casing).
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderField::MessageType => "MessageType",
            HeaderField::Version => "Version",
            HeaderField::MessageId => "MessageId",
            HeaderField::TimeStamp => "TimeStamp",
            HeaderField::Encoding => "Encoding",
            HeaderField::Algorithm => "Algorithm",
            HeaderField::KeyId => "KeyId",
            HeaderField::KeyUrl => "KeyURL",
            HeaderField::Iv => "IV",
            HeaderField::SigningCertUrl => "SigningCertURL",
            HeaderField::Signature => "Signature",
            HeaderField::MessageContext => "MessageContext",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope header.
///
/// Contains no secret material: the IV and signature are public values, the
/// key itself is only ever referenced by id or URL. The whole header may
/// therefore be logged for diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    #[serde(
        rename = "MessageType",
        alias = "messageType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_type: Option<String>,

    #[serde(
        rename = "Version",
        alias = "version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    #[serde(
        rename = "MessageId",
        alias = "messageId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_id: Option<String>,

    #[serde(
        rename = "TimeStamp",
        alias = "timestamp",
        alias = "Timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,

    #[serde(
        rename = "Encoding",
        alias = "encoding",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub encoding: Option<String>,

    /// Absent means `aes128cbc`.
    #[serde(
        rename = "Algorithm",
        alias = "algorithm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub algorithm: Option<String>,

    #[serde(
        rename = "KeyId",
        alias = "keyId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub key_id: Option<String>,

    #[serde(
        rename = "KeyURL",
        alias = "keyUrl",
        alias = "keyURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub key_url: Option<String>,

    /// Base64 initialization vector.
    #[serde(
        rename = "IV",
        alias = "iv",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub iv: Option<String>,

    #[serde(
        rename = "SigningCertURL",
        alias = "signingCertUrl",
        alias = "signingCertURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub signing_cert_url: Option<String>,

    /// Base64 signature over the canonical signing string.
    #[serde(
        rename = "Signature",
        alias = "signature",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub signature: Option<String>,

    /// Base64 JSON action context (group service only).
    #[serde(
        rename = "MessageContext",
        alias = "messageContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_context: Option<String>,
}

impl EnvelopeHeader {
    /// Raw value of a header field, if present.
    pub fn get(&self, field: HeaderField) -> Option<&str> {
        let value = match field {
            HeaderField::MessageType => &self.message_type,
            HeaderField::Version => &self.version,
            HeaderField::MessageId => &self.message_id,
            HeaderField::TimeStamp => &self.timestamp,
            HeaderField::Encoding => &self.encoding,
            HeaderField::Algorithm => &self.algorithm,
            HeaderField::KeyId => &self.key_id,
            HeaderField::KeyUrl => &self.key_url,
            HeaderField::Iv => &self.iv,
            HeaderField::SigningCertUrl => &self.signing_cert_url,
            HeaderField::Signature => &self.signature,
            HeaderField::MessageContext => &self.message_context,
        };
        value.as_deref()
    }

    /// Value of a field the current step cannot proceed without.
    ///
    /// # Errors
    ///
    /// `EnvelopeError::MissingField` naming the absent field.
    pub fn require(&self, field: HeaderField) -> Result<&str, EnvelopeError> {
        self.get(field).ok_or(EnvelopeError::MissingField(field))
    }

    /// Declared message type, or the empty string.
    pub fn message_type_or_empty(&self) -> &str {
        self.message_type.as_deref().unwrap_or_default()
    }

    /// Declared version, or the empty string.
    pub fn version_or_empty(&self) -> &str {
        self.version.as_deref().unwrap_or_default()
    }
}

/// A raw change-event envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Header", alias = "header")]
    pub header: EnvelopeHeader,

    /// Base64 ciphertext, exactly as received.
    #[serde(rename = "Body", alias = "body", default)]
    pub body: String,
}

impl Envelope {
    /// Build an envelope from its parts.
    pub fn new(header: EnvelopeHeader, body: impl Into<String>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// Parse a raw envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// `EnvelopeError::Malformed` when the input is not JSON or lacks a header.
    pub fn from_json(raw: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Serialize back to the registration casing.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
