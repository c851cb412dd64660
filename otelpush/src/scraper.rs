//! Exposition endpoint scraping with retry.

use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::error::TransportError;

/// Fetches the exposition body, retrying with exponential backoff.
pub struct Scraper {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl Scraper {
    /// Create a new scraper.
    pub fn new(config: ScrapeConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch the body, making up to `max_attempts` attempts.
    ///
    /// Connection errors and non-success statuses are both retried. There is
    /// no sleep after the last attempt.
    pub async fn fetch(&self) -> Result<String, TransportError> {
        let max_attempts = self.config.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.fetch_once().await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!(attempt, "Scrape succeeded after retry");
                    }
                    info!(url = %self.config.url, bytes = body.len(), "Scraped metrics");
                    return Ok(body);
                }
                Err(e) => {
                    if attempt < max_attempts {
                        let delay = self.config.backoff(attempt);
                        warn!(
                            url = %self.config.url,
                            error = %e,
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Failed to get metrics, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(TransportError::RetriesExhausted {
            url: self.config.url.clone(),
            attempts: max_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    async fn fetch_once(&self) -> Result<String, TransportError> {
        let response = self.client.get(&self.config.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                url: self.config.url.clone(),
                status,
                body,
            });
        }

        Ok(response.text().await?)
    }
}
