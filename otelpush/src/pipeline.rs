//! One scrape-convert-push cycle.

use std::io::Write;

use tracing::{info, warn};

use otelpush_common::{
    Attribute, BatchPolicy, Document, Scope, assemble, current_timestamp_nanos, encode,
    encode_pretty, parse_exposition,
};

use crate::config::Config;
use crate::error::TransportError;
use crate::pusher::Pusher;
use crate::scraper::Scraper;

/// Where the assembled document goes.
pub enum Sink {
    /// Push to the OTLP endpoint.
    Push(Pusher),
    /// Print pretty JSON to stdout instead of pushing.
    Stdout,
}

/// Statistics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub metrics: usize,
    pub comments: usize,
    pub skipped: usize,
    pub bytes: usize,
    pub pushed: bool,
}

/// Scrapes, converts and delivers one batch.
pub struct Pipeline {
    scraper: Scraper,
    sink: Sink,
    policy: BatchPolicy,
    resource: Vec<Attribute>,
    scope: Scope,
}

impl Pipeline {
    /// Build a pipeline from configuration.
    ///
    /// The API key is resolved from the environment unless `dry_run` is set.
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self, TransportError> {
        let sink = if dry_run {
            Sink::Stdout
        } else {
            let api_key = config
                .push
                .resolve_api_key(|name| std::env::var(name).ok())?;
            Sink::Push(Pusher::new(&config.push, &api_key)?)
        };

        Ok(Self {
            scraper: Scraper::new(config.scrape.clone())?,
            sink,
            policy: config.batch.on_malformed,
            resource: config.push.resource_attributes(),
            scope: config.push.scope(),
        })
    }

    /// Run one cycle, capturing the wall clock once for the whole batch.
    pub async fn run_once(&self) -> Result<RunStats, TransportError> {
        let body = self.scraper.fetch().await?;
        self.deliver(&body, current_timestamp_nanos()).await
    }

    /// Run one cycle with an explicit capture timestamp.
    pub async fn run_once_at(&self, captured_at: i64) -> Result<RunStats, TransportError> {
        let body = self.scraper.fetch().await?;
        self.deliver(&body, captured_at).await
    }

    /// Build the document for `body` without delivering it.
    pub fn document(
        &self,
        body: &str,
        captured_at: i64,
    ) -> Result<(Document, RunStats), TransportError> {
        let batch = parse_exposition(body, self.policy)?;

        if !batch.skipped.is_empty() {
            warn!(skipped = batch.skipped.len(), "Dropped malformed metric lines");
        }

        let stats = RunStats {
            metrics: batch.metrics.len(),
            comments: batch.comments,
            skipped: batch.skipped.len(),
            ..RunStats::default()
        };

        let document = assemble(batch.metrics, captured_at)
            .with_resource(self.resource.clone())
            .with_scope(self.scope.clone());

        Ok((document, stats))
    }

    async fn deliver(&self, body: &str, captured_at: i64) -> Result<RunStats, TransportError> {
        let (document, mut stats) = self.document(body, captured_at)?;

        match &self.sink {
            Sink::Push(pusher) => {
                let encoded = encode(&document)?;
                stats.bytes = encoded.len();
                pusher.push(encoded).await?;
                stats.pushed = true;
            }
            Sink::Stdout => {
                let pretty = encode_pretty(&document)?;
                stats.bytes = pretty.len();
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", pretty).map_err(otelpush_common::Error::from)?;
            }
        }

        info!(
            metrics = stats.metrics,
            comments = stats.comments,
            skipped = stats.skipped,
            bytes = stats.bytes,
            pushed = stats.pushed,
            "Run complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_pipeline(policy: BatchPolicy) -> Pipeline {
        let mut config = Config::default();
        config.batch.on_malformed = policy;
        config.push.service_name = Some("node".to_string());
        Pipeline::from_config(&config, true).unwrap()
    }

    #[test]
    fn test_dry_run_needs_no_api_key() {
        let mut config = Config::default();
        config.push.api_key_env = "OTELPUSH_TEST_UNSET_VARIABLE".to_string();

        assert!(Pipeline::from_config(&config, true).is_ok());
        assert!(matches!(
            Pipeline::from_config(&config, false).err().unwrap(),
            TransportError::MissingApiKey { .. }
        ));
    }

    #[test]
    fn test_document_is_decorated() {
        let pipeline = dry_pipeline(BatchPolicy::Abort);

        let (doc, stats) = pipeline.document("# TYPE up gauge\nup 1\n", 9).unwrap();

        assert_eq!(stats.metrics, 1);
        assert_eq!(stats.comments, 1);
        let group = &doc.resource_metrics[0];
        assert_eq!(
            group.resource.as_ref().unwrap().attributes[0].value_str(),
            "node"
        );
        assert_eq!(group.scope_metrics[0].scope.as_ref().unwrap().name, "otelpush");
    }

    #[test]
    fn test_document_policy() {
        let body = "up 1\nbroken\n";

        assert!(dry_pipeline(BatchPolicy::Abort).document(body, 1).is_err());

        let (doc, stats) = dry_pipeline(BatchPolicy::Skip).document(body, 1).unwrap();
        assert_eq!(doc.metrics().count(), 1);
        assert_eq!(stats.skipped, 1);
    }
}
