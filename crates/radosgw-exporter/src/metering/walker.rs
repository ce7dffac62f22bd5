//! Per-user entity walk
//!
//! Lists every user, then fetches each user's detail and bucket statistics.
//! A failure for one user only skips that user; only the listing itself is
//! fatal to the walk.

use std::fmt;

use futures::stream::{self, StreamExt};
use radosgw_admin::{AdminApi, AdminError, BucketStats, Quota, User};
use tracing::{debug, instrument};

use crate::metrics::{Measurement, MetricKind, MetricLabelSet, BUCKET_TOTAL_CATEGORY};

const KIB: i64 = 1024;

/// Quota limits of one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaRecord {
    pub enabled: Option<bool>,
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
}

impl QuotaRecord {
    /// Size limit in bytes; negative means unlimited
    pub fn max_size_bytes(&self) -> Option<i64> {
        self.max_size_kb.map(|kb| kb.saturating_mul(KIB))
    }
}

impl From<&Quota> for QuotaRecord {
    fn from(quota: &Quota) -> Self {
        Self {
            enabled: quota.enabled,
            max_size_kb: quota.max_size_kb,
            max_objects: quota.max_objects,
        }
    }
}

/// Totals and quotas of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: String,
    pub total_bytes: Option<u64>,
    pub total_objects: Option<u64>,
    pub user_quota: QuotaRecord,
    pub bucket_quota: QuotaRecord,
}

impl UserRecord {
    /// `listed_uid` labels the record when the detail carries no user id
    pub fn from_user(user: &User, listed_uid: &str) -> Self {
        let id = if user.user_id.is_empty() {
            listed_uid
        } else {
            &user.user_id
        };
        Self {
            user: id.to_string(),
            total_bytes: user.stats.size,
            total_objects: user.stats.num_objects,
            user_quota: QuotaRecord::from(&user.user_quota),
            bucket_quota: QuotaRecord::from(&user.bucket_quota),
        }
    }

    pub fn measurements(&self, store: &str) -> Vec<Measurement> {
        let labels = MetricLabelSet::user(self.user.clone(), store);
        let mut out = Vec::new();
        let mut push = |kind: MetricKind, value: Option<f64>| {
            if let Some(value) = value {
                out.push(Measurement::new(kind, labels.clone(), value));
            }
        };

        push(MetricKind::UserTotalBytes, self.total_bytes.map(|v| v as f64));
        push(MetricKind::UserTotalObjects, self.total_objects.map(|v| v as f64));
        push(MetricKind::UserQuotaEnabled, self.user_quota.enabled.map(flag));
        push(
            MetricKind::UserQuotaMaxSizeBytes,
            self.user_quota.max_size_bytes().map(|v| v as f64),
        );
        push(
            MetricKind::UserQuotaMaxObjects,
            self.user_quota.max_objects.map(|v| v as f64),
        );
        push(MetricKind::UserBucketQuotaEnabled, self.bucket_quota.enabled.map(flag));
        push(
            MetricKind::UserBucketQuotaMaxSizeBytes,
            self.bucket_quota.max_size_bytes().map(|v| v as f64),
        );
        push(
            MetricKind::UserBucketQuotaMaxObjects,
            self.bucket_quota.max_objects.map(|v| v as f64),
        );
        out
    }
}

fn flag(enabled: bool) -> f64 {
    if enabled {
        1.0
    } else {
        0.0
    }
}

/// Current size of one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRecord {
    pub bucket: String,
    pub owner: String,
    pub bytes: Option<u64>,
    pub objects: Option<u64>,
}

impl From<&BucketStats> for BucketRecord {
    fn from(stats: &BucketStats) -> Self {
        Self {
            bucket: stats.bucket.clone(),
            owner: stats.owner.clone(),
            bytes: stats.usage.rgw_main.size_actual,
            objects: stats.usage.rgw_main.num_objects,
        }
    }
}

impl BucketRecord {
    pub fn measurements(&self, store: &str) -> Vec<Measurement> {
        let labels = MetricLabelSet::Bucket {
            bucket: self.bucket.clone(),
            owner: self.owner.clone(),
            category: BUCKET_TOTAL_CATEGORY.to_string(),
            store: store.to_string(),
        };
        let mut out = Vec::with_capacity(2);
        if let Some(bytes) = self.bytes {
            out.push(Measurement::new(MetricKind::BucketUsageBytes, labels.clone(), bytes as f64));
        }
        if let Some(objects) = self.objects {
            out.push(Measurement::new(MetricKind::BucketUsageObjects, labels, objects as f64));
        }
        out
    }
}

/// Why some or all of a user's data is missing from the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UserDetail(String),
    BucketList(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UserDetail(cause) => write!(f, "user detail fetch failed: {}", cause),
            SkipReason::BucketList(cause) => write!(f, "bucket list fetch failed: {}", cause),
        }
    }
}

/// Per-user result of the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    Resolved {
        user: UserRecord,
        buckets: Vec<BucketRecord>,
    },
    /// User gauges are kept; bucket gauges are missing
    Partial {
        uid: String,
        user: UserRecord,
        reason: SkipReason,
    },
    Skipped {
        uid: String,
        reason: SkipReason,
    },
}

/// Outcomes of a full walk, in listing order
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub outcomes: Vec<UserOutcome>,
}

impl WalkReport {
    pub fn resolved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UserOutcome::Resolved { .. }))
            .count()
    }

    /// Users with missing data, whether skipped entirely or partially
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            UserOutcome::Skipped { uid, reason } | UserOutcome::Partial { uid, reason, .. } => {
                Some((uid.as_str(), reason))
            }
            UserOutcome::Resolved { .. } => None,
        })
    }

    /// User measurements followed by that user's bucket measurements
    pub fn measurements(&self, store: &str) -> Vec<Measurement> {
        let mut out = Vec::new();
        for outcome in &self.outcomes {
            match outcome {
                UserOutcome::Resolved { user, buckets } => {
                    out.extend(user.measurements(store));
                    for bucket in buckets {
                        out.extend(bucket.measurements(store));
                    }
                }
                UserOutcome::Partial { user, .. } => out.extend(user.measurements(store)),
                UserOutcome::Skipped { .. } => {}
            }
        }
        out
    }
}

/// Walks users and their buckets
#[derive(Debug, Clone)]
pub struct EntityWalker {
    concurrency: usize,
}

impl EntityWalker {
    pub fn new() -> Self {
        Self { concurrency: 1 }
    }

    /// Number of users fetched at once; clamped to at least 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Walk every listed user. Only a listing failure is returned as an error.
    #[instrument(skip(self, api), fields(concurrency = self.concurrency))]
    pub async fn walk(&self, api: &dyn AdminApi) -> Result<WalkReport, AdminError> {
        let uids = api.list_user_ids().await?;
        debug!(users = uids.len(), "Listed users");

        let outcomes: Vec<UserOutcome> = stream::iter(uids)
            .map(|uid| Self::resolve_user(api, uid))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = WalkReport { outcomes };
        for (uid, reason) in report.skipped() {
            debug!(user = %uid, reason = %reason, "Skipping user data");
        }
        Ok(report)
    }

    /// Fetch detail and buckets of one user.
    ///
    /// A failed detail fetch skips the user; a failed bucket listing only
    /// drops that user's bucket gauges.
    pub async fn resolve_user(api: &dyn AdminApi, uid: String) -> UserOutcome {
        let user = match api.get_user(&uid).await {
            Ok(user) => user,
            Err(e) => {
                return UserOutcome::Skipped {
                    uid,
                    reason: SkipReason::UserDetail(e.to_string()),
                }
            }
        };

        let record = UserRecord::from_user(&user, &uid);
        match api.list_user_buckets_with_stats(&uid).await {
            Ok(buckets) => UserOutcome::Resolved {
                user: record,
                buckets: buckets.iter().map(BucketRecord::from).collect(),
            },
            Err(e) => UserOutcome::Partial {
                uid,
                user: record,
                reason: SkipReason::BucketList(e.to_string()),
            },
        }
    }
}

impl Default for EntityWalker {
    fn default() -> Self {
        Self::new()
    }
}
