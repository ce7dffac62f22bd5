//! Usage aggregation
//!
//! Folds the usage-entries response into per-(bucket, owner, category, store)
//! counters. The gateway reports one record per bucket and time slot, so the
//! same key routinely shows up several times in one response and must be
//! merged.

use std::collections::HashMap;

use radosgw_admin::{AdminApi, UsageCategory, UsageQuery, UsageResponse};
use tracing::{debug, instrument};

use crate::metrics::{Measurement, MetricKind, MetricLabelSet};

/// Bucket identity for account-level operations that carry no bucket name
pub const BUCKET_ROOT: &str = "bucket_root";

/// Aggregation key for grouping usage
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UsageKey {
    pub bucket: String,
    /// Usage entry owner
    pub owner: String,
    /// Request category, e.g. `get_obj`
    pub category: String,
    pub store: String,
}

impl UsageKey {
    pub fn new(bucket: &str, owner: &str, category: &str, store: &str) -> Self {
        let bucket = if bucket.is_empty() { BUCKET_ROOT } else { bucket };
        Self {
            bucket: bucket.to_string(),
            owner: owner.to_string(),
            category: category.to_string(),
            store: store.to_string(),
        }
    }

    pub fn labels(&self) -> MetricLabelSet {
        MetricLabelSet::Bucket {
            bucket: self.bucket.clone(),
            owner: self.owner.clone(),
            category: self.category.clone(),
            store: self.store.clone(),
        }
    }
}

/// Summed counters for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageAccumulator {
    pub ops: u64,
    pub successful_ops: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl UsageAccumulator {
    pub fn add(&mut self, category: &UsageCategory) {
        self.ops = self.ops.saturating_add(category.ops);
        self.successful_ops = self.successful_ops.saturating_add(category.successful_ops);
        self.bytes_sent = self.bytes_sent.saturating_add(category.bytes_sent);
        self.bytes_received = self.bytes_received.saturating_add(category.bytes_received);
    }

    pub fn merge(&mut self, other: &UsageAccumulator) {
        self.ops = self.ops.saturating_add(other.ops);
        self.successful_ops = self.successful_ops.saturating_add(other.successful_ops);
        self.bytes_sent = self.bytes_sent.saturating_add(other.bytes_sent);
        self.bytes_received = self.bytes_received.saturating_add(other.bytes_received);
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct UsageAggregate {
    entries: HashMap<UsageKey, UsageAccumulator>,
}

impl UsageAggregate {
    pub fn get(&self, key: &UsageKey) -> Option<&UsageAccumulator> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UsageKey, &UsageAccumulator)> {
        self.entries.iter()
    }

    /// Sum of every key's counters
    pub fn totals(&self) -> UsageAccumulator {
        let mut totals = UsageAccumulator::default();
        for acc in self.entries.values() {
            totals.merge(acc);
        }
        totals
    }

    /// Four counter measurements per key, in key order
    pub fn measurements(&self) -> Vec<Measurement> {
        let mut keys: Vec<&UsageKey> = self.entries.keys().collect();
        keys.sort();

        let mut out = Vec::with_capacity(keys.len() * 4);
        for key in keys {
            let acc = &self.entries[key];
            let labels = key.labels();
            out.push(Measurement::new(MetricKind::UsageOps, labels.clone(), acc.ops as f64));
            out.push(Measurement::new(
                MetricKind::UsageSuccessfulOps,
                labels.clone(),
                acc.successful_ops as f64,
            ));
            out.push(Measurement::new(
                MetricKind::UsageBytesSent,
                labels.clone(),
                acc.bytes_sent as f64,
            ));
            out.push(Measurement::new(
                MetricKind::UsageBytesReceived,
                labels,
                acc.bytes_received as f64,
            ));
        }
        out
    }
}

/// Usage aggregator for one store
#[derive(Debug, Clone)]
pub struct UsageAggregator {
    store: String,
}

impl UsageAggregator {
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    /// Fold a usage response into per-key counters
    pub fn aggregate(&self, usage: &UsageResponse) -> UsageAggregate {
        let mut entries: HashMap<UsageKey, UsageAccumulator> = HashMap::new();

        for entry in &usage.entries {
            for bucket in &entry.buckets {
                for category in &bucket.categories {
                    let key = UsageKey::new(&bucket.bucket, &entry.user, &category.category, &self.store);
                    entries.entry(key).or_default().add(category);
                }
            }
        }

        UsageAggregate { entries }
    }

    /// Query the gateway for usage entries and aggregate them
    #[instrument(skip(self, api))]
    pub async fn collect(&self, api: &dyn AdminApi) -> radosgw_admin::Result<UsageAggregate> {
        let usage = api.get_usage(&UsageQuery::entries_only()).await?;
        let aggregate = self.aggregate(&usage);
        debug!(
            entries = usage.entries.len(),
            keys = aggregate.len(),
            "Aggregated usage"
        );
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use radosgw_admin::{UsageBucket, UsageEntry};

    fn category(name: &str, ops: u64, bytes_sent: u64) -> UsageCategory {
        UsageCategory {
            category: name.to_string(),
            ops,
            successful_ops: ops,
            bytes_sent,
            bytes_received: 0,
        }
    }

    fn entry(user: &str, bucket: &str, categories: Vec<UsageCategory>) -> UsageEntry {
        UsageEntry {
            user: user.to_string(),
            buckets: vec![UsageBucket {
                bucket: bucket.to_string(),
                owner: user.to_string(),
                categories,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_merges_repeated_keys() {
        let usage = UsageResponse {
            entries: vec![
                entry("alice", "photos", vec![category("get_obj", 3, 100)]),
                entry("alice", "photos", vec![category("get_obj", 5, 200)]),
            ],
        };

        let aggregate = UsageAggregator::new("us-east-1").aggregate(&usage);
        assert_eq!(aggregate.len(), 1);

        let key = UsageKey::new("photos", "alice", "get_obj", "us-east-1");
        let acc = aggregate.get(&key).unwrap();
        assert_eq!(acc.ops, 8);
        assert_eq!(acc.bytes_sent, 300);

        let measurements = aggregate.measurements();
        assert_eq!(measurements.len(), 4);
        assert_eq!(measurements[0].kind, MetricKind::UsageOps);
        assert_eq!(measurements[0].value, 8.0);
        assert_eq!(
            measurements[0].labels,
            MetricLabelSet::Bucket {
                bucket: "photos".into(),
                owner: "alice".into(),
                category: "get_obj".into(),
                store: "us-east-1".into(),
            }
        );
    }

    #[test]
    fn test_empty_bucket_defaults_to_root() {
        let usage = UsageResponse {
            entries: vec![entry("bob", "", vec![category("list_buckets", 2, 10)])],
        };

        let aggregate = UsageAggregator::new("eu").aggregate(&usage);
        let key = UsageKey::new("bucket_root", "bob", "list_buckets", "eu");
        assert_eq!(aggregate.get(&key).map(|a| a.ops), Some(2));
    }

    #[test]
    fn test_duplicate_input_doubles_counters() {
        let single = UsageResponse {
            entries: vec![entry(
                "carol",
                "logs",
                vec![category("put_obj", 4, 0), category("get_obj", 1, 64)],
            )],
        };
        let doubled = UsageResponse {
            entries: vec![single.entries[0].clone(), single.entries[0].clone()],
        };

        let aggregator = UsageAggregator::new("s");
        let once = aggregator.aggregate(&single);
        let twice = aggregator.aggregate(&doubled);

        assert_eq!(once.len(), twice.len());
        for (key, acc) in once.iter() {
            let doubled = twice.get(key).unwrap();
            assert_eq!(doubled.ops, acc.ops * 2);
            assert_eq!(doubled.bytes_sent, acc.bytes_sent * 2);
        }
    }

    #[test]
    fn test_counters_saturate() {
        let mut acc = UsageAccumulator {
            ops: u64::MAX - 1,
            ..Default::default()
        };
        acc.add(&category("get_obj", 5, 0));
        assert_eq!(acc.ops, u64::MAX);
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        let aggregate = UsageAggregator::new("s").aggregate(&UsageResponse::default());
        assert!(aggregate.is_empty());
        assert!(aggregate.measurements().is_empty());
    }

    fn arb_category() -> impl Strategy<Value = UsageCategory> {
        (
            prop::sample::select(vec!["get_obj", "put_obj", "delete_obj"]),
            0u64..1_000_000,
            0u64..1_000_000,
            0u64..1_000_000,
            0u64..1_000_000,
        )
            .prop_map(|(name, ops, successful_ops, bytes_sent, bytes_received)| UsageCategory {
                category: name.to_string(),
                ops,
                successful_ops,
                bytes_sent,
                bytes_received,
            })
    }

    fn arb_entry() -> impl Strategy<Value = UsageEntry> {
        (
            prop::sample::select(vec!["alice", "bob"]),
            prop::sample::select(vec!["", "photos", "logs"]),
            prop::collection::vec(arb_category(), 0..4),
        )
            .prop_map(|(user, bucket, categories)| entry(user, bucket, categories))
    }

    proptest! {
        #[test]
        fn prop_totals_are_conserved(entries in prop::collection::vec(arb_entry(), 0..20)) {
            let mut expected = UsageAccumulator::default();
            for category in entries.iter().flat_map(|e| &e.buckets).flat_map(|b| &b.categories) {
                expected.add(category);
            }

            let aggregate = UsageAggregator::new("s").aggregate(&UsageResponse { entries });
            prop_assert_eq!(aggregate.totals(), expected);
        }
    }
}
