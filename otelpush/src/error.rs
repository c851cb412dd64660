//! Transport error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while scraping or pushing.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every fetch attempt failed.
    #[error("Failed to fetch {url}: gave up after {attempts} attempts (last error: {last_error})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// HTTP client error (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response.
    #[error("Unexpected HTTP status {status} from {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// No bearer token available.
    #[error("API key is not configured: set push.api_key or the {env} environment variable")]
    MissingApiKey { env: String },

    /// Header name or value rejected by the HTTP client.
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// Parsing or encoding failure in the core.
    #[error(transparent)]
    Core(#[from] otelpush_common::Error),
}

impl TransportError {
    pub(crate) fn invalid_header(name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: err.to_string(),
        }
    }
}
