//! # radosgw-admin
//!
//! Read-only client for the Ceph RADOS Gateway admin API.
//!
//! ## Operations
//!
//! - [`AdminApi::get_usage`]: per-user, per-bucket operation counters
//! - [`AdminApi::list_user_ids`]: every user known to the gateway
//! - [`AdminApi::get_user`]: quotas and storage totals of one user
//! - [`AdminApi::list_user_buckets_with_stats`]: bucket sizes and object counts
//!
//! Requests are authenticated with AWS Signature Version 4 (see [`signer`]).
//! [`AdminClient`] is the HTTP implementation; consumers depend on the
//! [`AdminApi`] trait so they can be exercised without a gateway.

pub mod client;
pub mod error;
pub mod signer;
pub mod types;

pub use client::{AdminApi, AdminClient, AdminClientConfig, DEFAULT_REGION, DEFAULT_TIMEOUT};
pub use error::{AdminError, Result};
pub use signer::Credentials;
pub use types::{
    BucketStats, BucketUsage, BucketUsageSection, Quota, UsageBucket, UsageCategory, UsageEntry,
    UsageQuery, UsageResponse, User, UserStats,
};
