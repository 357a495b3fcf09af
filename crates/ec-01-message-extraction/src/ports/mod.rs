//! Ports layer: trait boundaries of the extraction subsystem.

pub mod inbound;
pub mod outbound;
