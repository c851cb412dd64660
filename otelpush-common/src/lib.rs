//! otelpush Common Library
//!
//! This crate holds the pure core of otelpush: turning Prometheus-style
//! exposition text into an OTLP-shaped metrics document.
//!
//! - [`exposition`] - Line classifier and metric line parser
//! - [`metric`] - Metric data model (`Metric`, `DataPoint`, `NumberValue`, `Attribute`)
//! - [`document`] - Document assembly and batch parsing policy
//! - [`serialization`] - JSON encoding and decoding
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod config;
pub mod document;
pub mod error;
pub mod exposition;
pub mod metric;
pub mod serialization;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use document::{
    BatchPolicy, Document, ParsedBatch, Resource, ResourceMetrics, Scope, ScopeMetrics, assemble,
    build_document, parse_exposition,
};
pub use error::{Error, LineErrorKind, MalformedLine, Result};
pub use exposition::{LineKind, classify, parse_metric_line};
pub use metric::{
    Attribute, AttributeValue, DataPoint, Gauge, Metric, NumberValue, current_timestamp_nanos,
};
pub use serialization::{JSON_CONTENT_TYPE, decode, encode, encode_pretty};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level` when set.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// # Example
///
/// ```ignore
/// use otelpush_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
