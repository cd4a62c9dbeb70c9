//! Index settings collector: counts read-only indices.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::collector::Collector;
use crate::descriptor::{ConstLabels, Descriptor, DescriptorTable, MetricDesc, Sample};
use crate::endpoint::Endpoint;
use crate::fetch::JsonFetcher;
use crate::health::ScrapeHealth;
use crate::naming::build_fq_name;
use crate::payload::IndicesSettings;

/// Metric subsystem of this collector.
pub const SUBSYSTEM: &str = "indices_settings_stats";

/// Cluster-wide metrics derived from `GET /_all/_settings`.
pub fn settings_metrics(
    namespace: &str,
    const_labels: &ConstLabels,
) -> DescriptorTable<IndicesSettings> {
    DescriptorTable::new(vec![Descriptor::gauge(
        MetricDesc::new(
            build_fq_name(namespace, SUBSYSTEM, "read_only_indices"),
            "Current number of read only indices within cluster",
            &[],
            const_labels,
        ),
        |settings: &IndicesSettings| settings.values().filter(|i| i.is_read_only()).count() as f64,
        |_: &str, _: &IndicesSettings| Vec::new(),
    )])
}

/// Collector for `<namespace>_indices_settings_stats_*` metrics.
///
/// Every metric carries a constant `url` label with the (redacted) cluster URL.
#[derive(Debug)]
pub struct IndicesSettingsCollector {
    endpoint: Endpoint,
    fetcher: JsonFetcher,
    health: ScrapeHealth,
    settings_metrics: DescriptorTable<IndicesSettings>,
}

impl IndicesSettingsCollector {
    pub fn new(
        client: Client,
        endpoint: Endpoint,
        namespace: &str,
        const_labels: &ConstLabels,
    ) -> Self {
        let mut const_labels = const_labels.clone();
        const_labels.retain(|(name, _)| name != "url");
        const_labels.push(("url".to_string(), endpoint.redacted()));

        let health = ScrapeHealth::new(namespace, SUBSYSTEM, "Indices Settings", &const_labels);
        Self {
            fetcher: JsonFetcher::new(client, health.parse_failures()),
            endpoint,
            health,
            settings_metrics: settings_metrics(namespace, &const_labels),
        }
    }

    /// Bookkeeping metrics of this collector.
    pub fn health(&self) -> &ScrapeHealth {
        &self.health
    }
}

#[async_trait]
impl Collector for IndicesSettingsCollector {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.health
            .descs()
            .into_iter()
            .chain(self.settings_metrics.descs())
            .collect()
    }

    async fn collect(&self) -> Vec<Sample> {
        self.health.begin_scrape();

        let url = self.endpoint.join(&["_all", "_settings"]);
        let mut samples = match self.fetcher.fetch::<IndicesSettings>(url).await {
            Ok(settings) => {
                self.health.set_up(true);
                debug!(indices = settings.len(), "Collected indices settings");
                self.settings_metrics.samples("", &settings).collect()
            }
            Err(e) => {
                self.health.set_up(false);
                warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Failed to fetch and decode indices settings"
                );
                Vec::new()
            }
        };

        samples.extend(self.health.samples());
        samples
    }
}
