//! Key service over HTTP.
//!
//! Key documents look like `{"ID": "...", "Secret": "<base64>"}`.

use super::http::{service_url, HttpError, HttpGetter, HttpResponse};
use async_trait::async_trait;
use ec_01_message_extraction::{KeyService, KeyServiceError, ResolvedKey};
use serde::Deserialize;

#[derive(Deserialize)]
struct KeyDocument {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Secret")]
    secret: String,
}

/// Key service client.
pub struct HttpKeyService {
    http: HttpGetter,
    base_url: String,
}

impl HttpKeyService {
    pub fn new(http: HttpGetter, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn key_url(&self, key_id: &str) -> Result<String, HttpError> {
        let file = format!("{key_id}.json");
        service_url(&self.base_url, &["key", "v1", "encryption", file.as_str()])
    }

    pub fn current_key_url(&self, message_type: &str) -> Result<String, HttpError> {
        service_url(
            &self.base_url,
            &["key", "v1", "type", message_type, "encryption", "current.json"],
        )
    }

    async fn fetch(&self, url: &str) -> Result<ResolvedKey, KeyServiceError> {
        let response = self
            .http
            .get(url, &[])
            .await
            .map_err(transport)?;
        parse_key_response(&response)
    }
}

fn transport(err: HttpError) -> KeyServiceError {
    KeyServiceError::Transport(err.to_string())
}

/// Interpret a key service response.
pub fn parse_key_response(response: &HttpResponse) -> Result<ResolvedKey, KeyServiceError> {
    if !response.is_success() {
        return Err(KeyServiceError::NotFound {
            status: response.status,
        });
    }
    let document: KeyDocument = serde_json::from_slice(&response.body)
        .map_err(|e| KeyServiceError::Malformed(e.to_string()))?;
    if document.secret.is_empty() {
        return Err(KeyServiceError::Malformed(format!(
            "key {} has no secret",
            document.id
        )));
    }
    Ok(ResolvedKey::new(document.id, document.secret))
}

#[async_trait]
impl KeyService for HttpKeyService {
    async fn key_by_id(&self, key_id: &str) -> Result<ResolvedKey, KeyServiceError> {
        let url = self.key_url(key_id).map_err(transport)?;
        self.fetch(&url).await
    }

    async fn current_key(&self, message_type: &str) -> Result<ResolvedKey, KeyServiceError> {
        let url = self.current_key_url(message_type).map_err(transport)?;
        self.fetch(&url).await
    }

    async fn key_by_url(&self, url: &str) -> Result<ResolvedKey, KeyServiceError> {
        self.fetch(url).await
    }
}
