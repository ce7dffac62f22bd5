//! Measurement schema and Prometheus rendering
//!
//! Metric names and label sets are part of the exporter's public contract and
//! must not change. Every collection pass renders into a fresh [`Registry`],
//! so nothing from an earlier pass can leak into a later scrape.

use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::Result;

/// Labels of bucket-scoped measurements
pub const BUCKET_LABELS: &[&str] = &["bucket", "owner", "category", "store"];

/// Labels of user-scoped measurements
pub const USER_LABELS: &[&str] = &["user", "store"];

/// Category attached to per-bucket size/object gauges
pub const BUCKET_TOTAL_CATEGORY: &str = "bucket_total";

/// Prometheus value type of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Counter,
    Gauge,
}

/// Every metric the exporter can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    UsageOps,
    UsageSuccessfulOps,
    UsageBytesSent,
    UsageBytesReceived,
    BucketUsageBytes,
    BucketUsageObjects,
    UserTotalBytes,
    UserTotalObjects,
    UserQuotaEnabled,
    UserQuotaMaxSizeBytes,
    UserQuotaMaxObjects,
    UserBucketQuotaEnabled,
    UserBucketQuotaMaxSizeBytes,
    UserBucketQuotaMaxObjects,
    ScrapeDurationSeconds,
    Up,
}

impl MetricKind {
    pub const ALL: [MetricKind; 16] = [
        MetricKind::UsageOps,
        MetricKind::UsageSuccessfulOps,
        MetricKind::UsageBytesSent,
        MetricKind::UsageBytesReceived,
        MetricKind::BucketUsageBytes,
        MetricKind::BucketUsageObjects,
        MetricKind::UserTotalBytes,
        MetricKind::UserTotalObjects,
        MetricKind::UserQuotaEnabled,
        MetricKind::UserQuotaMaxSizeBytes,
        MetricKind::UserQuotaMaxObjects,
        MetricKind::UserBucketQuotaEnabled,
        MetricKind::UserBucketQuotaMaxSizeBytes,
        MetricKind::UserBucketQuotaMaxObjects,
        MetricKind::ScrapeDurationSeconds,
        MetricKind::Up,
    ];

    /// Exposition name
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::UsageOps => "radosgw_usage_ops_total",
            MetricKind::UsageSuccessfulOps => "radosgw_usage_successful_ops_total",
            MetricKind::UsageBytesSent => "radosgw_usage_sent_bytes_total",
            MetricKind::UsageBytesReceived => "radosgw_usage_received_bytes_total",
            MetricKind::BucketUsageBytes => "radosgw_usage_bucket_bytes",
            MetricKind::BucketUsageObjects => "radosgw_usage_bucket_objects",
            MetricKind::UserTotalBytes => "radosgw_usage_user_total_bytes",
            MetricKind::UserTotalObjects => "radosgw_usage_user_total_objects",
            MetricKind::UserQuotaEnabled => "radosgw_usage_user_quota_enabled",
            MetricKind::UserQuotaMaxSizeBytes => "radosgw_usage_user_quota_size_bytes",
            MetricKind::UserQuotaMaxObjects => "radosgw_usage_user_quota_size_objects",
            MetricKind::UserBucketQuotaEnabled => "radosgw_usage_user_bucket_quota_enabled",
            MetricKind::UserBucketQuotaMaxSizeBytes => "radosgw_usage_user_bucket_quota_size_bytes",
            MetricKind::UserBucketQuotaMaxObjects => "radosgw_usage_user_bucket_quota_size_objects",
            MetricKind::ScrapeDurationSeconds => "radosgw_usage_scrape_duration_seconds",
            MetricKind::Up => "radosgw_up",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricKind::UsageOps => "Number of operations",
            MetricKind::UsageSuccessfulOps => "Number of successful operations",
            MetricKind::UsageBytesSent => "Bytes sent by the RADOSGW",
            MetricKind::UsageBytesReceived => "Bytes received by the RADOSGW",
            MetricKind::BucketUsageBytes => "Bucket used bytes",
            MetricKind::BucketUsageObjects => "Number of objects in bucket",
            MetricKind::UserTotalBytes => "Usage of bytes by user",
            MetricKind::UserTotalObjects => "Usage of objects by user",
            MetricKind::UserQuotaEnabled => "User quota enabled",
            MetricKind::UserQuotaMaxSizeBytes => "Maximum allowed size in bytes for user",
            MetricKind::UserQuotaMaxObjects => {
                "Maximum allowed number of objects across all user buckets"
            }
            MetricKind::UserBucketQuotaEnabled => "User per-bucket-quota enabled",
            MetricKind::UserBucketQuotaMaxSizeBytes => {
                "Maximum allowed size in bytes for each bucket of user"
            }
            MetricKind::UserBucketQuotaMaxObjects => {
                "Maximum allowed number of objects in each user bucket"
            }
            MetricKind::ScrapeDurationSeconds => "Amount of time each scrape takes",
            MetricKind::Up => "Whether the RADOSGW exporter is able to communicate with RADOSGW.",
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            MetricKind::UsageOps
            | MetricKind::UsageSuccessfulOps
            | MetricKind::UsageBytesSent
            | MetricKind::UsageBytesReceived => ValueType::Counter,
            _ => ValueType::Gauge,
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricKind::UsageOps
            | MetricKind::UsageSuccessfulOps
            | MetricKind::UsageBytesSent
            | MetricKind::UsageBytesReceived
            | MetricKind::BucketUsageBytes
            | MetricKind::BucketUsageObjects => BUCKET_LABELS,
            MetricKind::ScrapeDurationSeconds | MetricKind::Up => &[],
            _ => USER_LABELS,
        }
    }
}

/// Label values attached to a measurement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricLabelSet {
    Bucket {
        bucket: String,
        owner: String,
        category: String,
        store: String,
    },
    User {
        user: String,
        store: String,
    },
    Unlabeled,
}

impl MetricLabelSet {
    pub fn user(user: impl Into<String>, store: impl Into<String>) -> Self {
        MetricLabelSet::User {
            user: user.into(),
            store: store.into(),
        }
    }

    /// Values in the order of the matching `*_LABELS` constant
    pub fn values(&self) -> Vec<&str> {
        match self {
            MetricLabelSet::Bucket {
                bucket,
                owner,
                category,
                store,
            } => vec![bucket, owner, category, store],
            MetricLabelSet::User { user, store } => vec![user, store],
            MetricLabelSet::Unlabeled => Vec::new(),
        }
    }
}

/// One named, labeled value
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub kind: MetricKind,
    pub labels: MetricLabelSet,
    pub value: f64,
}

impl Measurement {
    pub fn new(kind: MetricKind, labels: MetricLabelSet, value: f64) -> Self {
        Self {
            kind,
            labels,
            value,
        }
    }

    /// Gauge-style 0/1 encoding of a flag
    pub fn flag(kind: MetricKind, labels: MetricLabelSet, flag: bool) -> Self {
        Self::new(kind, labels, if flag { 1.0 } else { 0.0 })
    }
}

/// Prometheus families for a single collection pass
pub struct PassMetrics {
    pub ops: CounterVec,
    pub successful_ops: CounterVec,
    pub bytes_sent: CounterVec,
    pub bytes_received: CounterVec,
    pub bucket_usage_bytes: GaugeVec,
    pub bucket_usage_objects: GaugeVec,
    pub user_total_bytes: GaugeVec,
    pub user_total_objects: GaugeVec,
    pub user_quota_enabled: GaugeVec,
    pub user_quota_max_size_bytes: GaugeVec,
    pub user_quota_max_objects: GaugeVec,
    pub user_bucket_quota_enabled: GaugeVec,
    pub user_bucket_quota_max_size_bytes: GaugeVec,
    pub user_bucket_quota_max_objects: GaugeVec,
    pub scrape_duration_seconds: Gauge,
    pub up: Gauge,
}

fn counter_vec(kind: MetricKind) -> Result<CounterVec> {
    Ok(CounterVec::new(
        Opts::new(kind.name(), kind.help()),
        kind.label_names(),
    )?)
}

fn gauge_vec(kind: MetricKind) -> Result<GaugeVec> {
    Ok(GaugeVec::new(
        Opts::new(kind.name(), kind.help()),
        kind.label_names(),
    )?)
}

fn gauge(kind: MetricKind) -> Result<Gauge> {
    Ok(Gauge::with_opts(Opts::new(kind.name(), kind.help()))?)
}

impl PassMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ops: counter_vec(MetricKind::UsageOps)?,
            successful_ops: counter_vec(MetricKind::UsageSuccessfulOps)?,
            bytes_sent: counter_vec(MetricKind::UsageBytesSent)?,
            bytes_received: counter_vec(MetricKind::UsageBytesReceived)?,
            bucket_usage_bytes: gauge_vec(MetricKind::BucketUsageBytes)?,
            bucket_usage_objects: gauge_vec(MetricKind::BucketUsageObjects)?,
            user_total_bytes: gauge_vec(MetricKind::UserTotalBytes)?,
            user_total_objects: gauge_vec(MetricKind::UserTotalObjects)?,
            user_quota_enabled: gauge_vec(MetricKind::UserQuotaEnabled)?,
            user_quota_max_size_bytes: gauge_vec(MetricKind::UserQuotaMaxSizeBytes)?,
            user_quota_max_objects: gauge_vec(MetricKind::UserQuotaMaxObjects)?,
            user_bucket_quota_enabled: gauge_vec(MetricKind::UserBucketQuotaEnabled)?,
            user_bucket_quota_max_size_bytes: gauge_vec(MetricKind::UserBucketQuotaMaxSizeBytes)?,
            user_bucket_quota_max_objects: gauge_vec(MetricKind::UserBucketQuotaMaxObjects)?,
            scrape_duration_seconds: gauge(MetricKind::ScrapeDurationSeconds)?,
            up: gauge(MetricKind::Up)?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.ops.clone()))?;
        registry.register(Box::new(self.successful_ops.clone()))?;
        registry.register(Box::new(self.bytes_sent.clone()))?;
        registry.register(Box::new(self.bytes_received.clone()))?;
        registry.register(Box::new(self.bucket_usage_bytes.clone()))?;
        registry.register(Box::new(self.bucket_usage_objects.clone()))?;
        registry.register(Box::new(self.user_total_bytes.clone()))?;
        registry.register(Box::new(self.user_total_objects.clone()))?;
        registry.register(Box::new(self.user_quota_enabled.clone()))?;
        registry.register(Box::new(self.user_quota_max_size_bytes.clone()))?;
        registry.register(Box::new(self.user_quota_max_objects.clone()))?;
        registry.register(Box::new(self.user_bucket_quota_enabled.clone()))?;
        registry.register(Box::new(self.user_bucket_quota_max_size_bytes.clone()))?;
        registry.register(Box::new(self.user_bucket_quota_max_objects.clone()))?;
        registry.register(Box::new(self.scrape_duration_seconds.clone()))?;
        registry.register(Box::new(self.up.clone()))?;
        Ok(())
    }

    /// Apply one measurement to its family
    pub fn record(&self, measurement: &Measurement) -> Result<()> {
        let labels = measurement.labels.values();
        let value = measurement.value;
        match measurement.kind {
            MetricKind::UsageOps => self.ops.get_metric_with_label_values(&labels)?.inc_by(value),
            MetricKind::UsageSuccessfulOps => self
                .successful_ops
                .get_metric_with_label_values(&labels)?
                .inc_by(value),
            MetricKind::UsageBytesSent => self
                .bytes_sent
                .get_metric_with_label_values(&labels)?
                .inc_by(value),
            MetricKind::UsageBytesReceived => self
                .bytes_received
                .get_metric_with_label_values(&labels)?
                .inc_by(value),
            MetricKind::BucketUsageBytes => self
                .bucket_usage_bytes
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::BucketUsageObjects => self
                .bucket_usage_objects
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserTotalBytes => self
                .user_total_bytes
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserTotalObjects => self
                .user_total_objects
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserQuotaEnabled => self
                .user_quota_enabled
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserQuotaMaxSizeBytes => self
                .user_quota_max_size_bytes
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserQuotaMaxObjects => self
                .user_quota_max_objects
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserBucketQuotaEnabled => self
                .user_bucket_quota_enabled
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserBucketQuotaMaxSizeBytes => self
                .user_bucket_quota_max_size_bytes
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::UserBucketQuotaMaxObjects => self
                .user_bucket_quota_max_objects
                .get_metric_with_label_values(&labels)?
                .set(value),
            MetricKind::ScrapeDurationSeconds => self.scrape_duration_seconds.set(value),
            MetricKind::Up => self.up.set(value),
        }
        Ok(())
    }
}

/// Encode `measurements` in the Prometheus text format.
///
/// Families without samples are left out of the output.
pub fn render(measurements: &[Measurement]) -> Result<String> {
    let registry = Registry::new();
    let metrics = PassMetrics::new()?;
    metrics.register(&registry)?;
    for measurement in measurements {
        metrics.record(measurement)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
