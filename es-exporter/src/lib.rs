//! Prometheus exporter for Elasticsearch snapshot statistics.
//!
//! On every Prometheus pull the registered collectors query the cluster's
//! REST API and turn the JSON responses into metric samples.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────────────────┐     ┌───────────────┐
//! │ Elasticsearch │<────│       Collectors        │<────│  HTTP Server  │
//! │   REST API    │     │ discover -> fetch each  │     │  (/metrics)   │
//! └───────────────┘     │ -> descriptor tables    │     └───────────────┘
//!                       └─────────────────────────┘
//! ```
//!
//! - [`fetch`]: one GET + JSON decode, counting decode failures
//! - [`scrape`]: discovery of entity ids, then per-entity fetches that drop
//!   failing entities instead of failing the scrape
//! - [`descriptor`]: metric identities paired with value/label functions
//! - [`snapshots`], [`indices_settings`]: the collectors
//! - [`registry`], [`exposition`], [`http`]: serving the results
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod descriptor;
pub mod endpoint;
pub mod exposition;
pub mod fetch;
pub mod health;
pub mod http;
pub mod indices_settings;
pub mod naming;
pub mod payload;
pub mod registry;
pub mod scrape;
pub mod snapshots;

pub use collector::{Collector, SharedCollector};
pub use config::ExporterConfig;
pub use endpoint::Endpoint;
pub use http::HttpServer;
pub use indices_settings::IndicesSettingsCollector;
pub use registry::{Registry, SharedRegistry};
pub use snapshots::SnapshotsCollector;

/// Default metric namespace.
pub const NAMESPACE: &str = "elasticsearch";
