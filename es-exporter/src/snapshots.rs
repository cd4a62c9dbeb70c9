//! Snapshot repository collector.
//!
//! Each cycle lists the snapshot repositories (`GET /_snapshot`), then fetches
//! every repository's snapshots (`GET /_snapshot/<repo>/_all`) on its own.
//! A repository that fails to load is dropped from that cycle only; a failed
//! listing marks the whole cycle down.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::collector::Collector;
use crate::descriptor::{ConstLabels, Descriptor, DescriptorTable, MetricDesc, Sample};
use crate::endpoint::Endpoint;
use crate::fetch::{FetchError, JsonFetcher};
use crate::health::ScrapeHealth;
use crate::naming::build_fq_name;
use crate::payload::{RepositorySnapshots, SnapshotInfo};
use crate::scrape::{discover, fetch_each};

/// Metric subsystem of this collector.
pub const SUBSYSTEM: &str = "snapshot_stats";

const SNAPSHOT_LABELS: &[&str] = &["repository", "state", "version"];
const REPOSITORY_LABELS: &[&str] = &["repository"];

fn snapshot_label_values(repository: &str, snapshot: &SnapshotInfo) -> Vec<String> {
    vec![
        repository.to_string(),
        snapshot.state.clone(),
        snapshot.version.clone(),
    ]
}

fn repository_label_values(repository: &str, _: &RepositorySnapshots) -> Vec<String> {
    vec![repository.to_string()]
}

/// Metrics derived from every fetched repository.
pub fn repository_metrics(
    namespace: &str,
    const_labels: &ConstLabels,
) -> DescriptorTable<RepositorySnapshots> {
    let desc = |name: &str, help: &str| {
        MetricDesc::new(
            build_fq_name(namespace, SUBSYSTEM, name),
            help,
            REPOSITORY_LABELS,
            const_labels,
        )
    };

    DescriptorTable::new(vec![
        Descriptor::gauge(
            desc("number_of_snapshots", "Number of snapshots in a repository"),
            |repo: &RepositorySnapshots| repo.snapshots.len() as f64,
            repository_label_values,
        ),
        Descriptor::gauge(
            desc("oldest_snapshot_timestamp", "Timestamp of the oldest snapshot"),
            |repo: &RepositorySnapshots| {
                repo.oldest()
                    .map(|s| s.start_time_secs() as f64)
                    .unwrap_or(0.0)
            },
            repository_label_values,
        ),
    ])
}

/// Metrics derived from the latest snapshot of a non-empty repository.
pub fn snapshot_metrics(
    namespace: &str,
    const_labels: &ConstLabels,
) -> DescriptorTable<SnapshotInfo> {
    let desc = |name: &str, help: &str| {
        MetricDesc::new(
            build_fq_name(namespace, SUBSYSTEM, name),
            help,
            SNAPSHOT_LABELS,
            const_labels,
        )
    };

    DescriptorTable::new(vec![
        Descriptor::gauge(
            desc("snapshot_number_of_indices", "Number of indices in the last snapshot"),
            |s: &SnapshotInfo| s.indices.len() as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_start_time_timestamp", "Last snapshot start timestamp"),
            |s: &SnapshotInfo| s.start_time_secs() as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_end_time_timestamp", "Last snapshot end timestamp"),
            |s: &SnapshotInfo| s.end_time_secs() as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_number_of_failures", "Last snapshot number of failures"),
            |s: &SnapshotInfo| s.failures.len() as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_total_shards", "Last snapshot total shards"),
            |s: &SnapshotInfo| s.shards.total as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_failed_shards", "Last snapshot failed shards"),
            |s: &SnapshotInfo| s.shards.failed as f64,
            snapshot_label_values,
        ),
        Descriptor::gauge(
            desc("snapshot_successful_shards", "Last snapshot successful shards"),
            |s: &SnapshotInfo| s.shards.successful as f64,
            snapshot_label_values,
        ),
    ])
}

/// Collector for `<namespace>_snapshot_stats_*` metrics.
#[derive(Debug)]
pub struct SnapshotsCollector {
    endpoint: Endpoint,
    fetcher: JsonFetcher,
    health: ScrapeHealth,
    repository_metrics: DescriptorTable<RepositorySnapshots>,
    snapshot_metrics: DescriptorTable<SnapshotInfo>,
}

impl SnapshotsCollector {
    /// Create a collector scraping `endpoint` with an already configured client.
    pub fn new(
        client: Client,
        endpoint: Endpoint,
        namespace: &str,
        const_labels: &ConstLabels,
    ) -> Self {
        let health = ScrapeHealth::new(namespace, SUBSYSTEM, "snapshots", const_labels);
        Self {
            fetcher: JsonFetcher::new(client, health.parse_failures()),
            endpoint,
            health,
            repository_metrics: repository_metrics(namespace, const_labels),
            snapshot_metrics: snapshot_metrics(namespace, const_labels),
        }
    }

    /// Bookkeeping metrics of this collector.
    pub fn health(&self) -> &ScrapeHealth {
        &self.health
    }

    /// List repositories, then fetch each one's snapshots.
    ///
    /// Only the listing can fail; repositories that fail to load are absent
    /// from the returned map.
    async fn fetch_repositories(
        &self,
    ) -> Result<BTreeMap<String, RepositorySnapshots>, FetchError> {
        let repositories = discover(&self.fetcher, self.endpoint.join(&["_snapshot"])).await?;

        let fetcher = &self.fetcher;
        let endpoint = &self.endpoint;
        let fetched = fetch_each(repositories, |repository| async move {
            let url = endpoint.join(&["_snapshot", repository.as_str(), "_all"]);
            fetcher.fetch::<RepositorySnapshots>(url).await
        })
        .await;

        Ok(fetched)
    }

    /// Data samples for the fetched repositories.
    fn data_samples(&self, repositories: &BTreeMap<String, RepositorySnapshots>) -> Vec<Sample> {
        let mut samples = Vec::new();

        for (name, repository) in repositories {
            samples.extend(self.repository_metrics.samples(name, repository));

            if let Some(latest) = repository.latest() {
                samples.extend(self.snapshot_metrics.samples(name, latest));
            }
        }

        samples
    }
}

#[async_trait]
impl Collector for SnapshotsCollector {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.snapshot_metrics
            .descs()
            .chain(self.repository_metrics.descs())
            .chain(self.health.descs())
            .collect()
    }

    async fn collect(&self) -> Vec<Sample> {
        self.health.begin_scrape();

        let mut samples = match self.fetch_repositories().await {
            Ok(repositories) => {
                self.health.set_up(true);
                let samples = self.data_samples(&repositories);
                debug!(
                    repositories = repositories.len(),
                    samples = samples.len(),
                    "Collected snapshot stats"
                );
                samples
            }
            Err(e) => {
                self.health.set_up(false);
                warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Failed to fetch and decode snapshot stats"
                );
                Vec::new()
            }
        };

        // Bookkeeping goes last on every path.
        samples.extend(self.health.samples());
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ShardCounts;

    fn snapshot(start_ms: i64, state: &str) -> SnapshotInfo {
        SnapshotInfo {
            snapshot: format!("snap-{start_ms}"),
            version: "7.17.0".to_string(),
            state: state.to_string(),
            start_time_in_millis: start_ms,
            end_time_in_millis: start_ms + 5_000,
            indices: vec!["logs".to_string(), "metrics".to_string()],
            shards: ShardCounts {
                total: 4,
                failed: 1,
                successful: 3,
            },
            ..Default::default()
        }
    }

    fn collector() -> SnapshotsCollector {
        SnapshotsCollector::new(
            Client::new(),
            Endpoint::parse("http://localhost:9200").unwrap(),
            "elasticsearch",
            &Vec::new(),
        )
    }

    #[test]
    fn test_repository_metrics_on_empty_repository() {
        let table = repository_metrics("elasticsearch", &Vec::new());
        let samples: Vec<_> = table
            .samples("backups", &RepositorySnapshots::default())
            .collect();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name(), "elasticsearch_snapshot_stats_number_of_snapshots");
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[1].name(), "elasticsearch_snapshot_stats_oldest_snapshot_timestamp");
        assert_eq!(samples[1].value, 0.0);
        assert_eq!(samples[0].label("repository"), Some("backups"));
    }

    #[test]
    fn test_oldest_snapshot_uses_first_record() {
        let repo = RepositorySnapshots {
            snapshots: vec![snapshot(100_000, "SUCCESS"), snapshot(200_000, "PARTIAL")],
        };
        let table = repository_metrics("elasticsearch", &Vec::new());
        let samples: Vec<_> = table.samples("backups", &repo).collect();

        assert_eq!(samples[0].value, 2.0);
        assert_eq!(samples[1].value, 100.0);
    }

    #[test]
    fn test_snapshot_metric_values() {
        let table = snapshot_metrics("elasticsearch", &Vec::new());
        let mut latest = snapshot(1_500_999, "SUCCESS");
        latest.failures = vec![serde_json::json!({"reason": "node left"})];

        let values: BTreeMap<_, _> = table
            .samples("backups", &latest)
            .map(|s| (s.name().to_string(), s.value))
            .collect();

        let get = |name: &str| values[&format!("elasticsearch_snapshot_stats_{name}")];
        assert_eq!(get("snapshot_number_of_indices"), 2.0);
        assert_eq!(get("snapshot_start_time_timestamp"), 1500.0);
        assert_eq!(get("snapshot_end_time_timestamp"), 1505.0);
        assert_eq!(get("snapshot_number_of_failures"), 1.0);
        assert_eq!(get("snapshot_total_shards"), 4.0);
        assert_eq!(get("snapshot_failed_shards"), 1.0);
        assert_eq!(get("snapshot_successful_shards"), 3.0);
    }

    #[test]
    fn test_label_arity_matches_schema() {
        let latest = snapshot(1_000, "SUCCESS");
        for sample in snapshot_metrics("es", &Vec::new()).samples("repo", &latest) {
            assert_eq!(sample.label_values.len(), sample.desc.variable_labels.len());
            assert_eq!(sample.label("state"), Some("SUCCESS"));
            assert_eq!(sample.label("version"), Some("7.17.0"));
        }

        let repo = RepositorySnapshots::default();
        for sample in repository_metrics("es", &Vec::new()).samples("repo", &repo) {
            assert_eq!(sample.label_values.len(), sample.desc.variable_labels.len());
        }
    }

    #[test]
    fn test_data_samples_use_latest_record() {
        let collector = collector();
        let mut repositories = BTreeMap::new();
        repositories.insert(
            "backups".to_string(),
            RepositorySnapshots {
                snapshots: vec![snapshot(100_000, "SUCCESS"), snapshot(200_000, "PARTIAL")],
            },
        );
        repositories.insert("empty".to_string(), RepositorySnapshots::default());

        let samples = collector.data_samples(&repositories);

        // 2 per repository, 7 for the one non-empty repository.
        assert_eq!(samples.len(), 2 + 2 + 7);

        let start = samples
            .iter()
            .find(|s| s.name() == "elasticsearch_snapshot_stats_snapshot_start_time_timestamp")
            .unwrap();
        assert_eq!(start.value, 200.0);
        assert_eq!(start.label("state"), Some("PARTIAL"));
        assert_eq!(start.label("repository"), Some("backups"));

        let empty = samples
            .iter()
            .filter(|s| s.label("repository") == Some("empty"))
            .count();
        assert_eq!(empty, 2);
    }

    #[test]
    fn test_describe_is_stable_and_side_effect_free() {
        let collector = collector();

        let first = collector.describe();
        let second = collector.describe();

        assert_eq!(first, second);
        assert_eq!(first.len(), 7 + 2 + 3);
        assert_eq!(collector.health().total_scrapes(), 0);
        assert_eq!(collector.health().json_parse_failures(), 0);
        assert_eq!(collector.health().up(), 0);
    }
}
