//! Adapters for the outbound ports that need no network.
//!
//! HTTP adapters live in the runtime crate.

pub mod memory_cache;
pub mod static_keys;

pub use memory_cache::InMemoryKeyCache;
pub use static_keys::{StaticCertificates, StaticKeyService};
