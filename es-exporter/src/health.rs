//! Per-collector scrape bookkeeping: `up`, `total_scrapes`, `json_parse_failures`.

use std::sync::Arc;

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;

use crate::descriptor::{ConstLabels, MetricDesc, MetricKind, Sample};
use crate::naming::build_fq_name;

/// Cycle-health metrics owned by one collector.
///
/// The handles are atomic and shared by clone, so the fetcher can bump the
/// parse-failure counter while a registry reads the values.
#[derive(Debug)]
pub struct ScrapeHealth {
    up: Gauge,
    total_scrapes: Counter,
    json_parse_failures: Counter,
    up_desc: Arc<MetricDesc>,
    total_scrapes_desc: Arc<MetricDesc>,
    json_parse_failures_desc: Arc<MetricDesc>,
}

impl ScrapeHealth {
    /// Create the bookkeeping metrics for `<namespace>_<subsystem>_*`.
    ///
    /// `target` names the scraped endpoint in help texts, e.g. "snapshots".
    pub fn new(namespace: &str, subsystem: &str, target: &str, const_labels: &ConstLabels) -> Self {
        Self {
            up: Gauge::default(),
            total_scrapes: Counter::default(),
            json_parse_failures: Counter::default(),
            up_desc: Arc::new(MetricDesc::new(
                build_fq_name(namespace, subsystem, "up"),
                format!("Was the last scrape of the ElasticSearch {target} endpoint successful."),
                &[],
                const_labels,
            )),
            total_scrapes_desc: Arc::new(MetricDesc::new(
                build_fq_name(namespace, subsystem, "total_scrapes"),
                format!("Current total ElasticSearch {target} scrapes."),
                &[],
                const_labels,
            )),
            json_parse_failures_desc: Arc::new(MetricDesc::new(
                build_fq_name(namespace, subsystem, "json_parse_failures"),
                "Number of errors while parsing JSON.",
                &[],
                const_labels,
            )),
        }
    }

    /// Handle to the parse-failure counter, for the collector's fetcher.
    pub fn parse_failures(&self) -> Counter {
        self.json_parse_failures.clone()
    }

    /// Record the start of a scrape cycle.
    pub fn begin_scrape(&self) {
        self.total_scrapes.inc();
    }

    /// Record whether the cycle's mandatory fetch succeeded.
    pub fn set_up(&self, up: bool) {
        self.up.set(i64::from(up));
    }

    pub fn up(&self) -> i64 {
        self.up.get()
    }

    pub fn total_scrapes(&self) -> u64 {
        self.total_scrapes.get()
    }

    pub fn json_parse_failures(&self) -> u64 {
        self.json_parse_failures.get()
    }

    /// Identities in emission order.
    pub fn descs(&self) -> [Arc<MetricDesc>; 3] {
        [
            Arc::clone(&self.up_desc),
            Arc::clone(&self.total_scrapes_desc),
            Arc::clone(&self.json_parse_failures_desc),
        ]
    }

    /// Current values as samples.
    pub fn samples(&self) -> [Sample; 3] {
        [
            Sample::new(
                Arc::clone(&self.up_desc),
                MetricKind::Gauge,
                Vec::new(),
                self.up() as f64,
            ),
            Sample::new(
                Arc::clone(&self.total_scrapes_desc),
                MetricKind::Counter,
                Vec::new(),
                self.total_scrapes() as f64,
            ),
            Sample::new(
                Arc::clone(&self.json_parse_failures_desc),
                MetricKind::Counter,
                Vec::new(),
                self.json_parse_failures() as f64,
            ),
        ]
    }
}
