//! Admin API response models
//!
//! These mirror the JSON the gateway returns. Statistics that the gateway may
//! leave out are `Option`s: an absent value must stay distinguishable from a
//! reported zero all the way to the exporter.

use serde::Deserialize;

/// Filters for the usage query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageQuery {
    /// Restrict to a single user
    pub uid: Option<String>,
    /// Lower time bound, `YYYY-MM-DD HH:MM:SS` or unix seconds
    pub start: Option<String>,
    /// Upper time bound
    pub end: Option<String>,
    /// Include per-entry detail
    pub show_entries: bool,
    /// Include the per-user summary rollup
    pub show_summary: bool,
}

impl UsageQuery {
    /// Per-entry detail for every user, without summary rollups
    pub fn entries_only() -> Self {
        Self {
            show_entries: true,
            show_summary: false,
            ..Default::default()
        }
    }

    /// Restrict the query to one user
    pub fn for_user(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Query string parameters for this filter
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("show-entries".to_string(), self.show_entries.to_string()),
            ("show-summary".to_string(), self.show_summary.to_string()),
        ];
        if let Some(uid) = &self.uid {
            params.push(("uid".to_string(), uid.clone()));
        }
        if let Some(start) = &self.start {
            params.push(("start".to_string(), start.clone()));
        }
        if let Some(end) = &self.end {
            params.push(("end".to_string(), end.clone()));
        }
        params
    }
}

/// Response of `GET /admin/usage`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageResponse {
    #[serde(default)]
    pub entries: Vec<UsageEntry>,
}

/// Usage records of one user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageEntry {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub buckets: Vec<UsageBucket>,
}

/// One bucket/time-slot record within a usage entry.
///
/// `bucket` is empty for account-level operations such as listing buckets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageBucket {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub epoch: u64,
    #[serde(default)]
    pub categories: Vec<UsageCategory>,
}

/// Operation counters for one request category (`get_obj`, `put_obj`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UsageCategory {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub ops: u64,
    #[serde(default)]
    pub successful_ops: u64,
    #[serde(default)]
    pub bytes_sent: u64,
    #[serde(default)]
    pub bytes_received: u64,
}

/// Quota definition, either account-wide or applied to every bucket of a user.
///
/// Limits are signed: the gateway reports `-1` for "no limit".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Quota {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub check_on_raw: Option<bool>,
    /// Maximum size in bytes
    #[serde(default)]
    pub max_size: Option<i64>,
    /// Maximum size in KiB
    #[serde(default)]
    pub max_size_kb: Option<i64>,
    #[serde(default)]
    pub max_objects: Option<i64>,
}

/// Storage totals of a user, present when requested with `stats=true`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub size_actual: Option<u64>,
    #[serde(default)]
    pub size_utilized: Option<u64>,
    #[serde(default)]
    pub num_objects: Option<u64>,
}

/// Response of `GET /admin/user`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub suspended: Option<u8>,
    #[serde(default)]
    pub user_quota: Quota,
    #[serde(default)]
    pub bucket_quota: Quota,
    #[serde(default)]
    pub stats: UserStats,
}

/// Per-bucket storage statistics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketStats {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub usage: BucketUsage,
}

/// Usage sections of a bucket, keyed by RADOS category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketUsage {
    /// Regular object data. Absent for buckets that never held objects.
    #[serde(rename = "rgw.main", default)]
    pub rgw_main: BucketUsageSection,
    #[serde(rename = "rgw.multimeta", default)]
    pub rgw_multimeta: Option<BucketUsageSection>,
}

/// Counters of a single bucket usage section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BucketUsageSection {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub size_actual: Option<u64>,
    #[serde(default)]
    pub size_utilized: Option<u64>,
    #[serde(default)]
    pub size_kb: Option<u64>,
    #[serde(default)]
    pub num_objects: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_response_parses_entries() {
        let body = r#"{
            "entries": [{
                "user": "alice",
                "buckets": [
                    {
                        "bucket": "photos",
                        "time": "2024-03-01 10:00:00.000000Z",
                        "epoch": 1709287200,
                        "owner": "alice",
                        "categories": [
                            {"category": "get_obj", "bytes_sent": 100, "bytes_received": 0, "ops": 3, "successful_ops": 3},
                            {"category": "put_obj", "bytes_sent": 0, "bytes_received": 512, "ops": 1, "successful_ops": 1}
                        ]
                    },
                    {
                        "bucket": "",
                        "time": "2024-03-01 10:00:00.000000Z",
                        "epoch": 1709287200,
                        "owner": "alice",
                        "categories": [{"category": "list_buckets", "ops": 2, "successful_ops": 2}]
                    }
                ]
            }],
            "summary": []
        }"#;

        let usage: UsageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(usage.entries.len(), 1);
        let entry = &usage.entries[0];
        assert_eq!(entry.user, "alice");
        assert_eq!(entry.buckets.len(), 2);
        assert_eq!(entry.buckets[0].categories[1].bytes_received, 512);
        assert_eq!(entry.buckets[1].bucket, "");
        assert_eq!(entry.buckets[1].categories[0].bytes_sent, 0);
    }

    #[test]
    fn test_user_keeps_absent_fields_absent() {
        let body = r#"{
            "user_id": "bob",
            "display_name": "Bob",
            "user_quota": {"enabled": true, "max_size_kb": 10, "max_objects": -1},
            "bucket_quota": {"enabled": false}
        }"#;

        let user: User = serde_json::from_str(body).unwrap();
        assert_eq!(user.user_quota.enabled, Some(true));
        assert_eq!(user.user_quota.max_size_kb, Some(10));
        assert_eq!(user.user_quota.max_objects, Some(-1));
        assert_eq!(user.bucket_quota.max_size_kb, None);
        assert_eq!(user.stats, UserStats::default());
        assert_eq!(user.stats.num_objects, None);
    }

    #[test]
    fn test_bucket_stats_without_main_section() {
        let body = r#"[
            {"bucket": "full", "owner": "bob", "usage": {"rgw.main": {"size": 2048, "size_actual": 4096, "num_objects": 2}}},
            {"bucket": "empty", "owner": "bob", "usage": {}}
        ]"#;

        let buckets: Vec<BucketStats> = serde_json::from_str(body).unwrap();
        assert_eq!(buckets[0].usage.rgw_main.size_actual, Some(4096));
        assert_eq!(buckets[0].usage.rgw_main.num_objects, Some(2));
        assert_eq!(buckets[1].usage.rgw_main, BucketUsageSection::default());
        assert_eq!(buckets[1].usage.rgw_multimeta, None);
    }

    #[test]
    fn test_bucket_stats_with_multimeta_section() {
        let body = r#"{"bucket": "uploads", "owner": "bob",
            "usage": {"rgw.main": {"size": 10, "num_objects": 1},
                      "rgw.multimeta": {"size": 0, "size_actual": 0, "num_objects": 3}},
            "unknown_field": true}"#;

        let bucket: BucketStats = serde_json::from_str(body).unwrap();
        assert_eq!(bucket.usage.rgw_main.size, Some(10));
        let multimeta = bucket.usage.rgw_multimeta.unwrap();
        assert_eq!(multimeta.num_objects, Some(3));
        assert_eq!(multimeta.size_kb, None);
    }

    #[test]
    fn test_entries_only_query_params() {
        let params = UsageQuery::entries_only().for_user("alice").to_params();
        assert!(params.contains(&("show-entries".to_string(), "true".to_string())));
        assert!(params.contains(&("show-summary".to_string(), "false".to_string())));
        assert!(params.contains(&("uid".to_string(), "alice".to_string())));
    }
}
