//! Typed Elasticsearch response bodies.
//!
//! Fields missing from a response, or explicitly `null`, decode to their
//! defaults so that value extraction never has to deal with absent data.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Decode a field, treating `null` as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `GET /_snapshot/<repository>/_all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepositorySnapshots {
    /// Snapshots in ascending start-time order, as returned by the cluster.
    #[serde(default, deserialize_with = "nullable")]
    pub snapshots: Vec<SnapshotInfo>,
}

impl RepositorySnapshots {
    /// The most recent snapshot, if any.
    ///
    /// Relies on the cluster's ordering; the list is not re-sorted.
    pub fn latest(&self) -> Option<&SnapshotInfo> {
        self.snapshots.last()
    }

    /// The oldest snapshot, if any.
    pub fn oldest(&self) -> Option<&SnapshotInfo> {
        self.snapshots.first()
    }
}

/// One snapshot record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotInfo {
    #[serde(deserialize_with = "nullable")]
    pub snapshot: String,
    #[serde(deserialize_with = "nullable")]
    pub uuid: String,
    #[serde(deserialize_with = "nullable")]
    pub version_id: i64,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub indices: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub state: String,
    #[serde(deserialize_with = "nullable")]
    pub start_time_in_millis: i64,
    #[serde(deserialize_with = "nullable")]
    pub end_time_in_millis: i64,
    #[serde(deserialize_with = "nullable")]
    pub duration_in_millis: i64,
    #[serde(deserialize_with = "nullable")]
    pub failures: Vec<serde_json::Value>,
    #[serde(deserialize_with = "nullable")]
    pub shards: ShardCounts,
}

impl SnapshotInfo {
    /// Start time in whole seconds since the epoch.
    pub fn start_time_secs(&self) -> i64 {
        self.start_time_in_millis / 1000
    }

    /// End time in whole seconds since the epoch.
    pub fn end_time_secs(&self) -> i64 {
        self.end_time_in_millis / 1000
    }
}

/// Shard outcome counts of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShardCounts {
    #[serde(deserialize_with = "nullable")]
    pub total: i64,
    #[serde(deserialize_with = "nullable")]
    pub failed: i64,
    #[serde(deserialize_with = "nullable")]
    pub successful: i64,
}

/// `GET /_all/_settings`: index name to its settings.
pub type IndicesSettings = BTreeMap<String, IndexSettingsEntry>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexSettingsEntry {
    #[serde(deserialize_with = "nullable")]
    pub settings: IndexSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    #[serde(deserialize_with = "nullable")]
    pub index: IndexInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexInfo {
    #[serde(deserialize_with = "nullable")]
    pub blocks: IndexBlocks,
}

/// Index blocks. Elasticsearch reports setting values as strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexBlocks {
    pub read_only: Option<String>,
}

impl IndexSettingsEntry {
    /// Whether `index.blocks.read_only` is set to `"true"`.
    pub fn is_read_only(&self) -> bool {
        self.settings.index.blocks.read_only.as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOTS: &str = r#"{
        "snapshots": [
            {
                "snapshot": "nightly-1",
                "uuid": "a1",
                "version_id": 7100099,
                "version": "7.10.0",
                "indices": ["logs-1", "logs-2"],
                "state": "SUCCESS",
                "start_time": "2020-01-01T00:00:00.000Z",
                "start_time_in_millis": 1577836800123,
                "end_time_in_millis": 1577836860999,
                "duration_in_millis": 60876,
                "failures": [],
                "shards": { "total": 10, "failed": 0, "successful": 10 }
            },
            {
                "snapshot": "nightly-2",
                "state": "PARTIAL",
                "version": "7.10.0",
                "start_time_in_millis": 1577923200000,
                "failures": [{ "index": "logs-2", "reason": "boom" }],
                "shards": { "total": 10, "failed": 2, "successful": 8 }
            }
        ]
    }"#;

    #[test]
    fn test_decode_repository_snapshots() {
        let decoded: RepositorySnapshots = serde_json::from_str(SNAPSHOTS).unwrap();

        assert_eq!(decoded.snapshots.len(), 2);
        assert_eq!(decoded.oldest().unwrap().snapshot, "nightly-1");
        assert_eq!(decoded.oldest().unwrap().indices.len(), 2);

        let latest = decoded.latest().unwrap();
        assert_eq!(latest.state, "PARTIAL");
        assert_eq!(latest.failures.len(), 1);
        assert_eq!(latest.shards.failed, 2);
        assert!(latest.indices.is_empty());
        assert_eq!(latest.end_time_in_millis, 0);
    }

    #[test]
    fn test_time_conversion_truncates() {
        let decoded: RepositorySnapshots = serde_json::from_str(SNAPSHOTS).unwrap();
        let oldest = decoded.oldest().unwrap();

        assert_eq!(oldest.start_time_secs(), 1577836800);
        assert_eq!(oldest.end_time_secs(), 1577836860);
    }

    #[test]
    fn test_empty_repository() {
        let decoded: RepositorySnapshots = serde_json::from_str("{}").unwrap();
        assert!(decoded.latest().is_none());
        assert!(decoded.oldest().is_none());
    }

    #[test]
    fn test_null_fields_decode_to_defaults() {
        let decoded: RepositorySnapshots =
            serde_json::from_str(r#"{"snapshots": null}"#).unwrap();
        assert!(decoded.snapshots.is_empty());

        let decoded: RepositorySnapshots = serde_json::from_str(
            r#"{"snapshots": [{
                "state": null,
                "version": "7.10.0",
                "indices": null,
                "failures": null,
                "start_time_in_millis": null,
                "shards": null
            }]}"#,
        )
        .unwrap();

        let latest = decoded.latest().unwrap();
        assert_eq!(latest.state, "");
        assert_eq!(latest.version, "7.10.0");
        assert!(latest.indices.is_empty());
        assert!(latest.failures.is_empty());
        assert_eq!(latest.start_time_in_millis, 0);
        assert_eq!(latest.shards, ShardCounts::default());
    }

    #[test]
    fn test_null_index_blocks() {
        let decoded: IndicesSettings = serde_json::from_str(
            r#"{"logs": {"settings": {"index": {"blocks": null}}}, "other": {"settings": null}}"#,
        )
        .unwrap();

        assert!(!decoded["logs"].is_read_only());
        assert!(!decoded["other"].is_read_only());
    }

    #[test]
    fn test_wrong_shape_is_error() {
        let result = serde_json::from_str::<RepositorySnapshots>(r#"{"snapshots": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_indices_settings() {
        let decoded: IndicesSettings = serde_json::from_str(
            r#"{
                "locked": {"settings": {"index": {"blocks": {"read_only": "true"}, "number_of_shards": "1"}}},
                "writable": {"settings": {"index": {"blocks": {"read_only": "false"}}}},
                "plain": {"settings": {"index": {"number_of_replicas": "1"}}}
            }"#,
        )
        .unwrap();

        assert!(decoded["locked"].is_read_only());
        assert!(!decoded["writable"].is_read_only());
        assert!(!decoded["plain"].is_read_only());
    }
}
