//! Domain layer: entities, errors and pure helpers. No I/O.

pub mod config;
pub mod entities;
pub mod errors;
pub mod framing;
