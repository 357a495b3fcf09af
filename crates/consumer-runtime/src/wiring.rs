//! # Wiring
//!
//! Assembles the engine from configuration: HTTP adapters for the upstream
//! services, the process-wide key cache, and in-memory local record stores.

use crate::adapters::{
    GwsMembership, HttpCertificateFetcher, HttpGetter, HttpKeyService, SwsScheduleGate,
};
use crate::config::ConsumerConfig;
use crate::RuntimeError;
use ec_01_message_extraction::{InMemoryKeyCache, MessageExtractionService};
use ec_02_activity_log::{ActivityLog, ActivityStore};
use ec_03_event_dispatch::{EnginePorts, EventEngine, MemoryRecordStore};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::info;

/// A wired engine and the stores it writes to.
pub struct Consumer {
    pub engine: EventEngine,
    pub records: Arc<MemoryRecordStore>,
}

/// Activity log over `store` on the system clock.
pub fn activity_log(config: &ConsumerConfig, store: Arc<dyn ActivityStore>) -> Arc<ActivityLog> {
    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    Arc::new(ActivityLog::new(store, time, config.activity))
}

/// Build the full ingest pipeline. Fails when an upstream URL is missing.
pub fn build_consumer(
    config: &ConsumerConfig,
    activity: Arc<ActivityLog>,
) -> Result<Consumer, RuntimeError> {
    let endpoints = config.require_endpoints()?;
    let http = HttpGetter::new(config.http_timeout)?;
    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

    let extraction = Arc::new(MessageExtractionService::new(
        config.extraction.clone(),
        Arc::new(HttpKeyService::new(http.clone(), endpoints.key_service)),
        Arc::new(InMemoryKeyCache::new()),
        Arc::new(HttpCertificateFetcher::new(http.clone())),
    ));

    let records = Arc::new(MemoryRecordStore::new());
    let ports = EnginePorts::with_store(
        records.clone(),
        Arc::new(SwsScheduleGate::new(http.clone(), endpoints.sws)),
        Arc::new(GwsMembership::new(http, endpoints.gws)),
        time,
    );

    info!(
        key_service = %endpoints.key_service,
        sws = %endpoints.sws,
        gws = %endpoints.gws,
        validate_signature = config.extraction.validate_signature,
        import_groups = config.dispatch.import_groups.len(),
        "consumer wired"
    );

    Ok(Consumer {
        engine: EventEngine::new(extraction, activity, ports, config.dispatch.clone()),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use ec_02_activity_log::InMemoryActivityStore;

    #[test]
    fn test_missing_endpoint_fails() {
        let config = ConsumerConfig::default();
        let log = activity_log(&config, Arc::new(InMemoryActivityStore::new()));
        let err = build_consumer(&config, log).err().unwrap();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::Missing("EC_KEY_SERVICE_URL"))
        ));
    }

    #[test]
    fn test_builds_with_endpoints() {
        let mut config = ConsumerConfig::default();
        config.endpoints.key_service = Some("http://127.0.0.1:9/keys".to_string());
        config.endpoints.sws = Some("http://127.0.0.1:9/sws".to_string());
        config.endpoints.gws = Some("http://127.0.0.1:9/gws".to_string());

        let log = activity_log(&config, Arc::new(InMemoryActivityStore::new()));
        let consumer = build_consumer(&config, log).unwrap();
        assert!(consumer.records.updates().is_empty());
    }
}
