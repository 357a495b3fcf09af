//! # Event Consumer Test Suite
//!
//! Cross-crate scenarios that drive the real extraction service, engine and
//! activity log together. Upstream services are replaced by the in-memory
//! adapters each crate ships.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Signed, encrypted envelopes and a wired engine
//!     ├── ingest_flows.rs   # Enrollment, instructor, key rotation, failures
//!     └── group_flows.rs    # Group-service messages and health reports
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ec-tests
//! cargo test -p ec-tests integration::group_flows
//! ```

pub mod integration;
