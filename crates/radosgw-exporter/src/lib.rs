//! # radosgw-exporter
//!
//! Prometheus exporter for Ceph RADOS Gateway usage, quota and bucket
//! statistics.
//!
//! Each scrape of `/metrics` runs one collection pass against the admin API:
//!
//! 1. Usage entries are folded into per-(bucket, owner, category) counters
//! 2. Every user is resolved to its totals, quotas and bucket sizes
//! 3. Pass duration and gateway health are appended
//!
//! A failing usage or user-listing query marks the pass unhealthy
//! (`radosgw_up 0`); a failing lookup for one user only skips that user.

pub mod config;
pub mod error;
pub mod metering;
pub mod metrics;
pub mod server;
pub mod snapshot;
pub mod telemetry;

pub use config::{ExporterConfig, LogFormat};
pub use error::{ExporterError, Result};
pub use metrics::{Measurement, MetricKind, MetricLabelSet};
pub use snapshot::{MetricSnapshot, SnapshotBuilder};

/// Exporter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
