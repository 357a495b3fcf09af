//! # Message Extraction Subsystem (EC-01)
//!
//! Turns an authenticated, encrypted envelope into a JSON payload.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): keys, payloads, errors, plaintext framing
//! - **Ports Layer** (`ports/`): `MessageExtractionApi` inbound; key service,
//!   key cache and certificate fetcher outbound
//! - **Service Layer** (`service/`): key provider, signature verifier, extractor
//! - **Adapters** (`adapters/`): in-memory cache and static key sources
//!
//! ## Processing
//!
//! ```text
//! Envelope ──► SignatureVerifier (optional) ──► KeyProvider ──► AES-128-CBC
//!                                                     ▲              │
//!                                                     └─ refresh ◄───┤ stale cached key
//!                                                                    ▼
//!                                                   strip framing ──► JSON payload
//! ```
//!
//! ## Security Notes
//!
//! - Key secrets are redacted from `Debug` output and wiped on drop.
//! - Signature failures of every kind surface as one `SignatureError`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{InMemoryKeyCache, StaticCertificates, StaticKeyService};
pub use domain::config::ExtractionConfig;
pub use domain::entities::{CacheKey, ExtractedPayload, KeyResolution, KeySource, ResolvedKey};
pub use domain::errors::{ExtractionError, KeyResolutionError, SignatureError};
pub use domain::framing::{looks_like_json_object, strip_framing};
pub use ports::inbound::MessageExtractionApi;
pub use ports::outbound::{
    CertificateFetchError, CertificateFetcher, KeyCache, KeyService, KeyServiceError,
};
pub use service::{
    canonical_signing_string, EventExtractor, KeyProvider, MessageExtractionService,
    SignatureVerifier,
};
