//! Scrape Prometheus-style metrics once and push them as OTLP/HTTP JSON.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use otelpush::config::ScrapeConfig;
use otelpush::{Config, Pipeline, RunStats, TransportError};
use otelpush_common::init_tracing;

/// Scrape a metrics endpoint and push it to an OTLP/HTTP endpoint.
#[derive(Parser, Debug)]
#[command(name = "otelpush")]
#[command(about = "Push Prometheus-style metrics to an OTLP/HTTP endpoint")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exposition endpoint to scrape (overrides config).
    #[arg(long, env = "OTELPUSH_SCRAPE_URL")]
    scrape_url: Option<String>,

    /// Scrape http://localhost:<PORT>/metrics (overrides config, loses to --scrape-url).
    #[arg(long, env = "EXPORTER_PORT")]
    exporter_port: Option<u16>,

    /// OTLP metrics endpoint (overrides config).
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Print the OTLP document to stdout instead of pushing it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::load_from_file(config_path)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(port) = args.exporter_port {
        config.scrape.url = ScrapeConfig::local_url(port);
    }
    if let Some(url) = args.scrape_url {
        config.scrape.url = url;
    }
    if let Some(endpoint) = args.endpoint {
        config.push.endpoint = endpoint;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!(
        scrape_url = %config.scrape.url,
        endpoint = %config.push.endpoint,
        on_malformed = ?config.batch.on_malformed,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    match run(&config, args.dry_run).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(e.into())
        }
    }
}

async fn run(config: &Config, dry_run: bool) -> Result<RunStats, TransportError> {
    let pipeline = Pipeline::from_config(config, dry_run)?;
    pipeline.run_once().await
}
