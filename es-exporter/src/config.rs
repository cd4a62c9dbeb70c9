//! Configuration for the Elasticsearch exporter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use es_exporter_common::LoggingConfig;

use crate::descriptor::ConstLabels;
use crate::http::HEALTH_PATH;
use crate::naming::{is_valid_label_name, is_valid_metric_name};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Elasticsearch connection settings.
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Which collectors to run.
    #[serde(default)]
    pub collectors: CollectorsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Elasticsearch connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster base URL; basic-auth credentials may be embedded.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_uri() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout() -> u64 {
    5
}

impl ElasticsearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9114").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Metric namespace (default: "elasticsearch").
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Constant labels added to all metrics.
    #[serde(default)]
    pub const_labels: BTreeMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:9114".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_namespace() -> String {
    crate::NAMESPACE.to_string()
}

impl PrometheusConfig {
    /// Constant labels in name order.
    pub fn const_labels(&self) -> ConstLabels {
        self.const_labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            namespace: default_namespace(),
            const_labels: BTreeMap::new(),
        }
    }
}

/// Collector toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorsConfig {
    /// Snapshot repository stats (default: on).
    #[serde(default = "default_true")]
    pub snapshots: bool,

    /// Read-only index count (default: off).
    #[serde(default)]
    pub indices_settings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            snapshots: true,
            indices_settings: false,
        }
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.elasticsearch.uri) {
            Ok(uri) if uri.scheme() == "http" || uri.scheme() == "https" => {}
            Ok(uri) => {
                return Err(ConfigError::Validation(format!(
                    "Unsupported Elasticsearch URI scheme: {}",
                    uri.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "Invalid Elasticsearch URI {}: {}",
                    self.elasticsearch.uri, e
                )));
            }
        }

        if self.elasticsearch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.prometheus.path == HEALTH_PATH {
            return Err(ConfigError::Validation(format!(
                "Metrics path must differ from {}",
                HEALTH_PATH
            )));
        }

        if !is_valid_metric_name(&self.prometheus.namespace) {
            return Err(ConfigError::Validation(format!(
                "Invalid namespace: {:?}",
                self.prometheus.namespace
            )));
        }

        if let Some(name) = self
            .prometheus
            .const_labels
            .keys()
            .find(|name| !is_valid_label_name(name))
        {
            return Err(ConfigError::Validation(format!(
                "Invalid constant label name: {:?}",
                name
            )));
        }

        if !self.collectors.snapshots && !self.collectors.indices_settings {
            return Err(ConfigError::Validation(
                "At least one collector must be enabled".to_string(),
            ));
        }

        Ok(())
    }
}
