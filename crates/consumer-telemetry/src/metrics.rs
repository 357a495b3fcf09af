//! Prometheus metrics for the event consumer.
//!
//! All metrics follow the naming convention: `ec_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Raw messages handed to the engine
    pub static ref MESSAGES_RECEIVED: IntCounter = IntCounter::new(
        "ec_messages_received_total",
        "Total messages received"
    ).expect("metric creation failed");

    /// Failed messages by response class
    pub static ref MESSAGES_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("ec_messages_failed_total", "Failed messages by response class"),
        &["class"]  // bad_request, authentication_failure, internal_error
    ).expect("metric creation failed");

    /// Events recorded in the activity log, by category
    pub static ref EVENTS_RECORDED: IntCounterVec = IntCounterVec::new(
        Opts::new("ec_events_recorded_total", "Events recorded by category"),
        &["category"]
    ).expect("metric creation failed");

    /// Per-message processing time
    pub static ref MESSAGE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ec_message_processing_duration_seconds",
            "Time spent processing one message"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered metrics are kept.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(MESSAGES_FAILED.clone()),
        Box::new(EVENTS_RECORDED.clone()),
        Box::new(MESSAGE_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

pub fn observe_received() {
    MESSAGES_RECEIVED.inc();
}

pub fn observe_failure(class: &str) {
    MESSAGES_FAILED.with_label_values(&[class]).inc();
}

pub fn observe_recorded(category: &str, count: u64) {
    EVENTS_RECORDED.with_label_values(&[category]).inc_by(count);
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
