//! Collection pass
//!
//! A [`SnapshotBuilder`] runs one full pass per call: usage query, then the
//! per-user walk. Upstream failures never escape a pass. They are logged and
//! folded into the `radosgw_up` gauge.

use std::sync::Arc;
use std::time::{Duration, Instant};

use radosgw_admin::AdminApi;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::metering::{EntityWalker, UsageAggregator};
use crate::metrics::{self, Measurement, MetricKind, MetricLabelSet};

/// Passes slower than this are logged as a warning
pub const SLOW_PASS_THRESHOLD: Duration = Duration::from_secs(10);

/// Measurements produced by one pass
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    /// All measurements; duration and health come last
    pub measurements: Vec<Measurement>,
    pub duration: Duration,
    /// Whether every fatal-class query succeeded
    pub healthy: bool,
    /// Users whose data is fully or partly missing from this pass
    pub skipped_users: usize,
    /// Whether the pass exceeded the slow-pass threshold
    pub slow: bool,
}

impl MetricSnapshot {
    /// Prometheus text exposition of this snapshot
    pub fn render(&self) -> Result<String> {
        metrics::render(&self.measurements)
    }

    pub fn value_of(&self, kind: MetricKind) -> Option<f64> {
        self.measurements
            .iter()
            .find(|m| m.kind == kind)
            .map(|m| m.value)
    }
}

/// Builds snapshots against one gateway
#[derive(Clone)]
pub struct SnapshotBuilder {
    api: Arc<dyn AdminApi>,
    aggregator: UsageAggregator,
    walker: EntityWalker,
    slow_threshold: Duration,
}

impl SnapshotBuilder {
    pub fn new(api: Arc<dyn AdminApi>, store: impl Into<String>) -> Self {
        Self {
            api,
            aggregator: UsageAggregator::new(store),
            walker: EntityWalker::new(),
            slow_threshold: SLOW_PASS_THRESHOLD,
        }
    }

    /// Duration above which a pass is logged as slow
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn with_user_concurrency(mut self, concurrency: usize) -> Self {
        self.walker = self.walker.with_concurrency(concurrency);
        self
    }

    pub fn store(&self) -> &str {
        self.aggregator.store()
    }

    /// Run one collection pass
    pub async fn collect(&self) -> MetricSnapshot {
        let pass_id = Uuid::new_v4();
        let span = info_span!("collect", pass_id = %pass_id, store = %self.store());
        self.collect_pass().instrument(span).await
    }

    async fn collect_pass(&self) -> MetricSnapshot {
        let started = Instant::now();
        let mut measurements = Vec::new();
        let mut skipped_users = 0;
        let healthy = self.run(&mut measurements, &mut skipped_users).await;
        let duration = started.elapsed();

        let slow = duration > self.slow_threshold;
        if slow {
            warn!(
                duration_secs = duration.as_secs_f64(),
                "Scrape took longer than {:?}", self.slow_threshold
            );
        }

        measurements.push(Measurement::new(
            MetricKind::ScrapeDurationSeconds,
            MetricLabelSet::Unlabeled,
            duration.as_secs_f64(),
        ));
        measurements.push(Measurement::flag(
            MetricKind::Up,
            MetricLabelSet::Unlabeled,
            healthy,
        ));

        debug!(
            healthy,
            skipped_users,
            measurements = measurements.len(),
            "Collection pass finished"
        );

        MetricSnapshot {
            measurements,
            duration,
            healthy,
            skipped_users,
            slow,
        }
    }

    /// Returns the health of the pass
    async fn run(&self, out: &mut Vec<Measurement>, skipped_users: &mut usize) -> bool {
        let usage = match self.aggregator.collect(self.api.as_ref()).await {
            Ok(usage) => usage,
            Err(e) => {
                error!(error = %e, "Failed to query RADOSGW usage");
                return false;
            }
        };
        out.extend(usage.measurements());

        let report = match self.walker.walk(self.api.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Failed to list RADOSGW users");
                return false;
            }
        };
        *skipped_users = report.skipped().count();
        out.extend(report.measurements(self.store()));
        true
    }
}
