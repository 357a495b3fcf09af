//! # Commands
//!
//! `consume` feeds newline-delimited raw envelopes to the engine strictly one
//! at a time and writes one JSON status line per envelope. `health` answers
//! activity queries.

use crate::RuntimeError;
use consumer_telemetry::{
    observe_failure, observe_received, observe_recorded, time_histogram, MESSAGE_DURATION,
};
use ec_02_activity_log::{parse_categories, ActivityLog, ActivityReport, SampleRange};
use ec_03_event_dispatch::EventIngestApi;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Outcome of one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStatus {
    pub line: usize,
    /// 200 on success, else the failure's response class code.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub recorded: u64,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Ingest every non-blank line of `input`.
///
/// Lines are passed on as raw bytes; input that is not valid text fails only
/// its own line.
pub async fn consume_lines<R, W>(
    engine: &dyn EventIngestApi,
    input: R,
    output: &mut W,
) -> Result<ConsumeSummary, RuntimeError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = ConsumeSummary::default();
    let mut lines = input.split(b'\n');
    let mut number = 0;

    while let Some(line) = lines.next_segment().await? {
        number += 1;
        let raw = line.trim_ascii();
        if raw.is_empty() {
            continue;
        }

        let status = ingest_line(engine, number, raw).await;
        if status.error.is_some() {
            summary.failed += 1;
        } else {
            summary.processed += 1;
        }
        writeln!(output, "{}", serde_json::to_string(&status)?)?;
    }

    Ok(summary)
}

/// Ingest one raw envelope and update the process metrics.
pub async fn ingest_line(engine: &dyn EventIngestApi, line: usize, raw: &[u8]) -> LineStatus {
    observe_received();
    let _timer = time_histogram!(MESSAGE_DURATION);

    match engine.ingest_raw(raw).await {
        Ok(report) => {
            if report.recorded > 0 {
                observe_recorded(report.category.as_str(), report.recorded);
            }
            LineStatus {
                line,
                status: 200,
                category: Some(report.category.as_str().to_string()),
                recorded: report.recorded,
                skipped: report.skipped().count(),
                error: None,
            }
        }
        Err(e) => {
            let class = e.response_class();
            observe_failure(class.as_str());
            LineStatus {
                line,
                status: class.status_code(),
                category: None,
                recorded: 0,
                skipped: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Activity report for a comma-separated category list.
pub async fn health_report(
    log: &ActivityLog,
    types: &str,
    on: Option<&str>,
    begin: Option<&str>,
    end: Option<&str>,
) -> Result<ActivityReport, RuntimeError> {
    let categories = parse_categories(types)?;
    let range = SampleRange::from_query(on, begin, end)?;
    Ok(log.report(&categories, range).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ec_02_activity_log::{ActivityConfig, InMemoryActivityStore};
    use ec_03_event_dispatch::{HandlerReport, IngestError, SkipReason};
    use parking_lot::Mutex;
    use shared_types::{EnvelopeError, EventCategory, FixedTimeSource, TimeSource};
    use std::sync::Arc;

    /// Accepts lines starting with `ok`, rejects the rest as malformed.
    #[derive(Default)]
    struct ScriptedEngine {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventIngestApi for ScriptedEngine {
        async fn ingest_raw(&self, raw: &[u8]) -> Result<HandlerReport, IngestError> {
            let text = String::from_utf8_lossy(raw).to_string();
            self.seen.lock().push(text.clone());
            if text.starts_with("ok") {
                let mut report = HandlerReport::new(EventCategory::Enrollment).with_recorded(2);
                report.loaded();
                report.skip(SkipReason::MissingNetId("r1".to_string()));
                Ok(report)
            } else {
                Err(EnvelopeError::Malformed(text).into())
            }
        }

        async fn ingest(
            &self,
            _envelope: &shared_types::Envelope,
        ) -> Result<HandlerReport, IngestError> {
            unreachable!("commands only pass raw input")
        }
    }

    #[tokio::test]
    async fn test_consume_lines_reports_each_envelope() {
        let engine = ScriptedEngine::default();
        let input: &[u8] = b"ok-1\n\n  \nbroken\nok-2\n";
        let mut output = Vec::new();

        let summary = consume_lines(&engine, input, &mut output).await.unwrap();

        assert_eq!(
            summary,
            ConsumeSummary {
                processed: 2,
                failed: 1
            }
        );
        assert_eq!(*engine.seen.lock(), vec!["ok-1", "broken", "ok-2"]);

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["line"], 1);
        assert_eq!(lines[0]["status"], 200);
        assert_eq!(lines[0]["category"], "enrollment");
        assert_eq!(lines[0]["recorded"], 2);
        assert_eq!(lines[0]["skipped"], 1);
        assert_eq!(lines[1]["line"], 4);
        assert_eq!(lines[1]["status"], 400);
        assert!(lines[1].get("category").is_none());
        assert!(lines[1]["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_fails_alone() {
        let engine = ScriptedEngine::default();
        let input: &[u8] = b"ok-1\n\xff\xfe garbage\r\nok-2\n";
        let mut output = Vec::new();

        let summary = consume_lines(&engine, input, &mut output).await.unwrap();

        assert_eq!(
            summary,
            ConsumeSummary {
                processed: 2,
                failed: 1
            }
        );
        assert_eq!(engine.seen.lock().len(), 3);
        assert_eq!(engine.seen.lock()[2], "ok-2");

        let statuses: Vec<u64> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["status"].as_u64().unwrap())
            .collect();
        assert_eq!(statuses, vec![200, 400, 200]);
    }

    #[tokio::test]
    async fn test_health_report() {
        let store = Arc::new(InMemoryActivityStore::new());
        let clock = Arc::new(FixedTimeSource::new(1_700_000_000));
        let log = ActivityLog::new(store, clock.clone(), ActivityConfig::default());
        log.record_success(EventCategory::Group, 3).await.unwrap();

        let report = health_report(&log, "group,person", None, None, None)
            .await
            .unwrap();
        assert_eq!(report[&EventCategory::Group].points, vec![3]);
        assert_eq!(report[&EventCategory::Person].points, vec![0]);

        let now = ec_02_activity_log::minute_to_rfc3339(clock.current_minute());
        let report = health_report(&log, "group", Some(&now), None, None)
            .await
            .unwrap();
        assert_eq!(report[&EventCategory::Group].points, vec![3]);
    }

    #[tokio::test]
    async fn test_health_rejects_unknown_category() {
        let log = ActivityLog::new(
            Arc::new(InMemoryActivityStore::new()),
            Arc::new(FixedTimeSource::new(0)),
            ActivityConfig::default(),
        );
        let err = health_report(&log, "enrollment,bogus", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Activity(_)));
    }
}
