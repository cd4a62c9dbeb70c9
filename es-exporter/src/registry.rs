//! Registry of collectors consulted on every Prometheus pull.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::collector::SharedCollector;
use crate::descriptor::{MetricDesc, Sample};
use crate::naming::{is_valid_label_name, is_valid_metric_name};

/// Errors raised when registering a collector.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Metric {0} is already registered")]
    Duplicate(String),

    #[error("Invalid metric name: {0:?}")]
    InvalidMetricName(String),

    #[error("Invalid label name {label:?} on metric {metric}")]
    InvalidLabelName { metric: String, label: String },

    #[error("Duplicate label name {label:?} on metric {metric}")]
    DuplicateLabel { metric: String, label: String },
}

/// Collectors in registration order, with the metric names they own.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<SharedCollector>,
    names: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector after checking its described identities.
    ///
    /// Rejects invalid names and names already owned by another collector
    /// (or repeated within this one). Nothing is registered on error.
    pub fn register(&mut self, collector: SharedCollector) -> Result<(), RegistryError> {
        let descs = collector.describe();
        let mut claimed = HashSet::with_capacity(descs.len());

        for desc in &descs {
            validate(desc)?;
            if self.names.contains(&desc.fq_name) || !claimed.insert(desc.fq_name.clone()) {
                return Err(RegistryError::Duplicate(desc.fq_name.clone()));
            }
        }

        debug!(metrics = descs.len(), "Registered collector");
        self.names.extend(claimed);
        self.collectors.push(collector);
        Ok(())
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Identities of every registered collector.
    pub fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.collectors.iter().flat_map(|c| c.describe()).collect()
    }

    /// Run one collect cycle on every collector, in registration order.
    pub async fn gather(&self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for collector in &self.collectors {
            samples.extend(collector.collect().await);
        }
        samples
    }
}

fn validate(desc: &MetricDesc) -> Result<(), RegistryError> {
    if !is_valid_metric_name(&desc.fq_name) {
        return Err(RegistryError::InvalidMetricName(desc.fq_name.clone()));
    }

    let labels = desc
        .const_labels
        .iter()
        .map(|(name, _)| name)
        .chain(desc.variable_labels.iter());
    let mut seen = HashSet::new();
    for label in labels {
        if !is_valid_label_name(label) {
            return Err(RegistryError::InvalidLabelName {
                metric: desc.fq_name.clone(),
                label: label.clone(),
            });
        }
        if !seen.insert(label.as_str()) {
            return Err(RegistryError::DuplicateLabel {
                metric: desc.fq_name.clone(),
                label: label.clone(),
            });
        }
    }

    Ok(())
}

/// Create a shareable registry handle.
pub type SharedRegistry = Arc<Registry>;
