//! Configuration for otelpush.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use otelpush_common::{Attribute, BatchPolicy, LoggingConfig, Scope};

use crate::error::TransportError;

/// Configuration validation errors.
///
/// Reading and parsing errors come from [`otelpush_common::load_config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete otelpush configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where to scrape the exposition text from.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Where and how to push the OTLP document.
    #[serde(default)]
    pub push: OtlpConfig,

    /// Handling of malformed metric lines.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scrape target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Exposition endpoint (e.g., "http://localhost:9100/metrics").
    #[serde(default = "default_scrape_url")]
    pub url: String,

    /// Total number of fetch attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubled after each further failure.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,
}

fn default_scrape_url() -> String {
    "http://localhost:9100/metrics".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_scrape_timeout() -> u64 {
    10
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: default_scrape_url(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            timeout_secs: default_scrape_timeout(),
        }
    }
}

impl ScrapeConfig {
    /// URL of a local exporter listening on `port`.
    pub fn local_url(port: u16) -> String {
        format!("http://localhost:{}/metrics", port)
    }

    /// Get timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms).saturating_mul(factor)
    }
}

/// OTLP/HTTP push configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtlpConfig {
    /// OTLP/HTTP metrics endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token. Falls back to the `api_key_env` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Extra headers to include in push requests.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Push timeout in seconds.
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,

    /// Service name for the OTLP resource.
    #[serde(default)]
    pub service_name: Option<String>,

    /// Resource attributes to add to the document.
    #[serde(default)]
    pub resource: BTreeMap<String, String>,
}

fn default_endpoint() -> String {
    "https://otlp-gateway-prod-ap-northeast-0.grafana.net/otlp/v1/metrics".to_string()
}

fn default_api_key_env() -> String {
    "GRAFANA_API_KEY".to_string()
}

fn default_push_timeout() -> u64 {
    30
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            api_key_env: default_api_key_env(),
            headers: BTreeMap::new(),
            timeout_secs: default_push_timeout(),
            service_name: None,
            resource: BTreeMap::new(),
        }
    }
}

impl OtlpConfig {
    /// Get timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the bearer token from config, then from `lookup(api_key_env)`.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<String, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .or_else(|| lookup(&self.api_key_env))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TransportError::MissingApiKey {
                env: self.api_key_env.clone(),
            })
    }

    /// Resource attributes: `service.name` first, then `resource` in key order.
    pub fn resource_attributes(&self) -> Vec<Attribute> {
        let mut attrs = Vec::with_capacity(1 + self.resource.len());

        if let Some(name) = &self.service_name {
            attrs.push(Attribute::new("service.name", name.clone()));
        }

        for (k, v) in &self.resource {
            attrs.push(Attribute::new(k.clone(), v.clone()));
        }

        attrs
    }

    /// Instrumentation scope naming this binary.
    pub fn scope(&self) -> Scope {
        Scope {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Batch parsing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// "abort" (default) fails the run on the first malformed line, "skip" drops it.
    #[serde(default)]
    pub on_malformed: BatchPolicy,
}

impl Config {
    /// Load configuration from a JSON5 file.
    ///
    /// The result is not validated, so command-line overrides can still fill
    /// in fields before [`Config::validate`] runs.
    pub fn load_from_file(path: impl AsRef<Path>) -> otelpush_common::Result<Self> {
        otelpush_common::load_config(path)
    }

    /// Parse configuration from a JSON5 string.
    #[cfg(test)]
    pub fn parse(content: &str) -> otelpush_common::Result<Self> {
        otelpush_common::parse_config(content)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("scrape.url", &self.scrape.url)?;
        validate_url("push.endpoint", &self.push.endpoint)?;

        if self.scrape.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "scrape.max_attempts must be > 0".to_string(),
            ));
        }

        if self.scrape.timeout_secs == 0 || self.push.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.push.api_key.is_none() && self.push.api_key_env.is_empty() {
            return Err(ConfigError::Validation(
                "push.api_key_env cannot be empty when push.api_key is unset".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )));
    }

    Ok(())
}
