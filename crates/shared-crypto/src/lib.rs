//! # Shared Crypto - Message-Level Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | AES-128-CBC, PKCS#7 | Event body decryption |
//! | `signatures` | RSA PKCS#1 v1.5 (SHA-1 / SHA-256) | Envelope signature check |
//!
//! ## Security Properties
//!
//! - Secret keys are zeroized on drop and never implement `Debug`.
//! - Padding and length failures are reported as a single
//!   `CryptoError::DecryptionFailed`; no partial plaintext is returned.
//! - CBC provides no integrity: authenticity of the body comes from the
//!   envelope signature, which is checked before decryption when enabled.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod signatures;
pub mod symmetric;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use errors::CryptoError;
pub use signatures::{SignatureDigest, SigningCertificate};
pub use symmetric::{decode_base64, decrypt, encrypt, Iv, SecretKey, BLOCK_LEN, KEY_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
