//! OTLP/HTTP push with bearer-token auth.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{info, trace, warn};

use otelpush_common::JSON_CONTENT_TYPE;

use crate::config::OtlpConfig;
use crate::error::TransportError;

/// Sends encoded documents to the OTLP endpoint.
pub struct Pusher {
    client: reqwest::Client,
    endpoint: String,
}

impl Pusher {
    /// Create a pusher authenticating with `api_key`.
    pub fn new(config: &OtlpConfig, api_key: &str) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::invalid_header(name, e))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| TransportError::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| TransportError::invalid_header(AUTHORIZATION.as_str(), e))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST an encoded document. Any non-success status is an error.
    pub async fn push(&self, body: Vec<u8>) -> Result<StatusCode, TransportError> {
        info!(endpoint = %self.endpoint, bytes = body.len(), "Pushing metrics");
        trace!(body = %String::from_utf8_lossy(&body), "Push request body");

        let response = self.client.post(&self.endpoint).body(body).send().await?;
        let status = response.status();

        info!(status = %status, "Push response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Push rejected");
            return Err(TransportError::Status {
                url: self.endpoint.clone(),
                status,
                body,
            });
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_invalid_extra_header() {
        let config = OtlpConfig {
            headers: BTreeMap::from([("bad header".to_string(), "x".to_string())]),
            ..OtlpConfig::default()
        };

        let err = Pusher::new(&config, "token").err().unwrap();
        assert!(matches!(err, TransportError::InvalidHeader { .. }));
    }

    #[test]
    fn test_invalid_api_key() {
        let err = Pusher::new(&OtlpConfig::default(), "line\nbreak")
            .err()
            .unwrap();
        assert!(err.to_string().contains("authorization"));
    }

    #[test]
    fn test_endpoint() {
        let pusher = Pusher::new(&OtlpConfig::default(), "token").unwrap();
        assert_eq!(pusher.endpoint(), OtlpConfig::default().endpoint);
    }
}
