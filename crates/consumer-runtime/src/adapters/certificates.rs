//! Signing certificate retrieval over HTTP.

use super::http::{HttpGetter, HttpResponse};
use async_trait::async_trait;
use ec_01_message_extraction::{CertificateFetchError, CertificateFetcher};

pub struct HttpCertificateFetcher {
    http: HttpGetter,
}

impl HttpCertificateFetcher {
    pub fn new(http: HttpGetter) -> Self {
        Self { http }
    }
}

/// PEM bytes of a successful response.
pub fn certificate_body(url: &str, response: HttpResponse) -> Result<Vec<u8>, CertificateFetchError> {
    if !response.is_success() {
        return Err(CertificateFetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

#[async_trait]
impl CertificateFetcher for HttpCertificateFetcher {
    async fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, CertificateFetchError> {
        let response =
            self.http
                .get(url, &[])
                .await
                .map_err(|e| CertificateFetchError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        certificate_body(url, response)
    }
}
