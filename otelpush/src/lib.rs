//! Prometheus-to-OTLP push gateway.
//!
//! This crate scrapes a Prometheus-style `/metrics` endpoint once, converts
//! every sample into an OTLP gauge data point and pushes the resulting
//! document as JSON to an OTLP/HTTP ingestion endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │    Exporter     │────>│    otelpush     │────>│  OTLP Endpoint  │
//! │   (/metrics)    │ GET │ (parse/assemble)│POST │  (/v1/metrics)  │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Parsing and document assembly live in `otelpush-common`; this crate adds
//! the HTTP transport around them.
//!
//! # Usage
//!
//! ```bash
//! GRAFANA_API_KEY=... otelpush --exporter-port 9100
//! otelpush --config config.json5 --dry-run
//! ```
//!
//! # Configuration
//!
//! See [`config::Config`] for configuration options.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod pusher;
pub mod scraper;

pub use config::Config;
pub use error::TransportError;
pub use pipeline::{Pipeline, RunStats, Sink};
pub use pusher::Pusher;
pub use scraper::Scraper;
