//! # Event Consumer Runtime
//!
//! The executable side of the consumer: configuration, HTTP adapters for the
//! upstream services, wiring, and the `consume` / `health` commands.
//!
//! ## Modular Structure
//!
//! - `config` - `ConsumerConfig` from environment variables
//! - `adapters/` - key service, certificates, schedule gate, membership,
//!   activity file
//! - `wiring` - builds the `EventEngine` from configuration
//! - `commands` - line-oriented ingest and health queries
//!
//! ## Startup Sequence
//!
//! 1. Install telemetry (tracing subscriber, metrics registry)
//! 2. Load and validate configuration
//! 3. Open the shared activity file
//! 4. Wire the engine and ingest envelopes one at a time

pub mod adapters;
pub mod commands;
pub mod config;
pub mod wiring;

pub use adapters::{ActivityFileError, HttpError};
pub use commands::{consume_lines, health_report, ingest_line, ConsumeSummary, LineStatus};
pub use config::{ConfigError, ConsumerConfig, Endpoints};
pub use wiring::{activity_log, build_consumer, Consumer};

use ec_02_activity_log::ActivityError;
use thiserror::Error;

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    ActivityFile(#[from] ActivityFileError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
