//! Adapters: in-memory record store and fixed upstream lookups.

pub mod memory_store;
pub mod static_lookups;

pub use memory_store::MemoryRecordStore;
pub use static_lookups::{StaticMembership, StaticScheduleGate};
