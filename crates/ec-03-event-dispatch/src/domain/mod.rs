//! Domain layer: records, payload shapes, policy and errors. No I/O.

pub mod config;
pub mod errors;
pub mod events;
pub mod outcome;
pub mod policy;
pub mod records;
pub mod timestamps;
