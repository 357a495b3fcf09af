//! # Consumer Telemetry
//!
//! Structured logging and Prometheus metrics for the event consumer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use consumer_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, wins over `EC_LOG_LEVEL` |
//! | `EC_LOG_LEVEL` | `info` | Log level filter |
//! | `EC_JSON_LOGS` | `true` in containers | JSON formatted logs |
//! | `EC_CONSOLE_OUTPUT` | `true` | Write logs to the console |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{parse_flag, TelemetryConfig};
pub use metrics::{
    gather_text, observe_failure, observe_received, observe_recorded, register_metrics,
    HistogramTimer, EVENTS_RECORDED, MESSAGES_FAILED, MESSAGES_RECEIVED, MESSAGE_DURATION,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_tracing(config)
}

/// Start timing a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
