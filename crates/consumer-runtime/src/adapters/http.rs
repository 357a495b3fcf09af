//! Shared HTTP GET client for the upstream services.

use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors talking to an upstream service.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid service URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Thin wrapper over a pooled `reqwest` client.
///
/// No retries: the transport redelivers messages that fail.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    client: Client,
}

impl HttpGetter {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(HttpError::Build)?;
        Ok(Self { client })
    }

    /// GET `url` with extra request headers.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|source| HttpError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|source| HttpError::Request {
                url: url.to_string(),
                source,
            })?;

        debug!(%url, status, bytes = body.len(), "upstream response");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// `base` extended by `segments`, each percent-encoded as one path segment.
pub fn service_url(base: &str, segments: &[&str]) -> Result<String, HttpError> {
    let invalid = |reason: String| HttpError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("not a hierarchical URL".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url() {
        assert_eq!(
            service_url("https://keys.example.edu/", &["key", "v1", "x.json"]).unwrap(),
            "https://keys.example.edu/key/v1/x.json"
        );
        assert_eq!(service_url("http://h/api", &["a"]).unwrap(), "http://h/api/a");
    }

    #[test]
    fn test_service_url_encodes_segments() {
        assert_eq!(
            service_url("https://gws.example.edu", &["group", "u_a/b c?x"]).unwrap(),
            "https://gws.example.edu/group/u_a%2Fb%20c%3Fx"
        );
    }

    #[test]
    fn test_service_url_rejects_bad_base() {
        assert!(matches!(
            service_url("not a url", &["a"]),
            Err(HttpError::InvalidUrl { .. })
        ));
        assert!(matches!(
            service_url("mailto:someone@example.edu", &["a"]),
            Err(HttpError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpGetter::new(Duration::from_secs(2)).is_ok());
    }
}
