//! Two-phase pull protocol between collectors and the registry.

use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::{MetricDesc, Sample};

/// A unit that scrapes one Elasticsearch API into metric samples.
///
/// The registry first enumerates identities with [`Collector::describe`],
/// then samples values with [`Collector::collect`] on every pull.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Static set of metric identities this collector can emit.
    ///
    /// Must be idempotent, side-effect free and perform no I/O.
    fn describe(&self) -> Vec<Arc<MetricDesc>>;

    /// Run one scrape cycle and return its samples.
    async fn collect(&self) -> Vec<Sample>;
}

/// Create a shareable collector handle.
pub type SharedCollector = Arc<dyn Collector>;
