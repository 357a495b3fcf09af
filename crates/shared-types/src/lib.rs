//! # Shared Types Crate
//!
//! Types shared by every subsystem of the event consumer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the inbound `Envelope` shape is defined here
//!   and nowhere else.
//! - **Header Authority**: routing decisions (message type, version, group
//!   context) are taken from the envelope header only; the body stays opaque
//!   until it has been authenticated and decrypted.
//! - **Deterministic Time**: wall-clock reads go through `TimeSource` so that
//!   minute-bucket accounting can be tested.

pub mod category;
pub mod envelope;
pub mod errors;
pub mod time;

pub use category::EventCategory;
pub use envelope::{Envelope, EnvelopeHeader, HeaderField};
pub use errors::EnvelopeError;
pub use time::{FixedTimeSource, SystemTimeSource, TimeSource};
