//! Metering module
//!
//! Turns admin API responses into measurements:
//! - UsageAggregator: folds usage entries into per-bucket counters
//! - EntityWalker: resolves per-user quotas, totals and bucket sizes

pub mod aggregator;
pub mod walker;

#[cfg(test)]
pub(crate) mod fake;

pub use aggregator::{UsageAccumulator, UsageAggregate, UsageAggregator, UsageKey, BUCKET_ROOT};
pub use walker::{
    BucketRecord, EntityWalker, QuotaRecord, SkipReason, UserOutcome, UserRecord, WalkReport,
};
