//! Time-schedule construction status from the student web service.
//!
//! Term documents carry `TimeScheduleConstruction`, a campus to flag map.
//! Campus names compare case-insensitively; a campus missing from the map
//! is not under construction. Term lookups are cached for the process
//! lifetime.

use super::http::{service_url, HttpError, HttpGetter, HttpResponse};
use async_trait::async_trait;
use ec_03_event_dispatch::{LookupError, ScheduleGate};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;

const SERVICE: &str = "sws";

#[derive(Deserialize)]
struct TermDocument {
    #[serde(rename = "TimeScheduleConstruction", default)]
    construction: HashMap<String, bool>,
}

/// Construction flags of one term, keyed by lowercase campus.
pub type TermConstruction = HashMap<String, bool>;

pub struct SwsScheduleGate {
    http: HttpGetter,
    base_url: String,
    terms: Mutex<HashMap<(String, String), TermConstruction>>,
}

impl SwsScheduleGate {
    pub fn new(http: HttpGetter, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            terms: Mutex::new(HashMap::new()),
        }
    }

    pub fn term_url(&self, year: &str, quarter: &str) -> Result<String, HttpError> {
        let term = format!("{year},{}.json", quarter.to_lowercase());
        service_url(&self.base_url, &["student", "v5", "term", term.as_str()])
    }

    async fn term(&self, year: &str, quarter: &str) -> Result<TermConstruction, LookupError> {
        let key = (year.to_string(), quarter.to_lowercase());
        if let Some(term) = self.terms.lock().get(&key) {
            return Ok(term.clone());
        }

        let url = self.term_url(year, quarter).map_err(lookup_error)?;
        let response = self.http.get(&url, &[]).await.map_err(lookup_error)?;
        let term = parse_term(&response)?;
        self.terms.lock().insert(key, term.clone());
        Ok(term)
    }
}

fn lookup_error(err: HttpError) -> LookupError {
    LookupError {
        service: SERVICE,
        reason: err.to_string(),
    }
}

/// Interpret a term document response.
pub fn parse_term(response: &HttpResponse) -> Result<TermConstruction, LookupError> {
    if !response.is_success() {
        return Err(LookupError {
            service: SERVICE,
            reason: format!("term lookup returned status {}", response.status),
        });
    }
    let document: TermDocument =
        serde_json::from_slice(&response.body).map_err(|e| LookupError {
            service: SERVICE,
            reason: format!("malformed term document: {e}"),
        })?;
    Ok(document
        .construction
        .into_iter()
        .map(|(campus, flag)| (campus.to_lowercase(), flag))
        .collect())
}

#[async_trait]
impl ScheduleGate for SwsScheduleGate {
    async fn is_under_construction(
        &self,
        campus: &str,
        year: &str,
        quarter: &str,
    ) -> Result<bool, LookupError> {
        let term = self.term(year, quarter).await?;
        Ok(term
            .get(&campus.to_lowercase())
            .copied()
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_term_url() {
        let gate = SwsScheduleGate::new(
            HttpGetter::new(Duration::from_secs(1)).unwrap(),
            "https://sws.example.edu",
        );
        assert_eq!(
            gate.term_url("2024", "Autumn").unwrap(),
            "https://sws.example.edu/student/v5/term/2024,autumn.json"
        );
    }

    #[test]
    fn test_parse_term_lowercases_campus() {
        let response = HttpResponse::new(
            200,
            r#"{"Year":2024,"Quarter":"Autumn","TimeScheduleConstruction":{"Seattle":true,"Bothell":false}}"#,
        );
        let term = parse_term(&response).unwrap();
        assert_eq!(term.get("seattle"), Some(&true));
        assert_eq!(term.get("bothell"), Some(&false));
        assert_eq!(term.get("tacoma"), None);
    }

    #[test]
    fn test_missing_construction_block_is_empty() {
        let term = parse_term(&HttpResponse::new(200, r#"{"Year":2024}"#)).unwrap();
        assert!(term.is_empty());
    }

    #[test]
    fn test_error_status() {
        let err = parse_term(&HttpResponse::new(503, "")).unwrap_err();
        assert_eq!(err.service, "sws");
        assert!(err.reason.contains("503"));
    }

    #[tokio::test]
    async fn test_cached_term_skips_request() {
        let gate = SwsScheduleGate::new(
            HttpGetter::new(Duration::from_secs(1)).unwrap(),
            "http://127.0.0.1:9",
        );
        let mut term = TermConstruction::new();
        term.insert("seattle".to_string(), true);
        gate.terms
            .lock()
            .insert(("2024".to_string(), "autumn".to_string()), term);

        assert!(gate
            .is_under_construction("Seattle", "2024", "AUTUMN")
            .await
            .unwrap());
        assert!(!gate
            .is_under_construction("tacoma", "2024", "autumn")
            .await
            .unwrap());
    }
}
