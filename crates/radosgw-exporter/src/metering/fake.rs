//! In-memory admin API for unit tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use radosgw_admin::{
    AdminApi, AdminError, BucketStats, BucketUsage, BucketUsageSection, Quota, Result,
    UsageQuery, UsageResponse, User, UserStats,
};

#[derive(Default)]
pub(crate) struct FakeAdmin {
    usage: Option<UsageResponse>,
    users: Vec<(String, User, Vec<BucketStats>)>,
    listing_fails: bool,
    detail_failures: HashSet<String>,
    bucket_failures: HashSet<String>,
    usage_calls: AtomicUsize,
}

impl FakeAdmin {
    pub fn new() -> Self {
        Self {
            usage: Some(UsageResponse::default()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: UsageResponse) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn failing_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    /// Add a user with a 10 KiB quota and one bucket holding all of its data
    pub fn with_user(mut self, uid: &str, bytes: u64, objects: u64) -> Self {
        let user = User {
            user_id: uid.to_string(),
            user_quota: Quota {
                enabled: Some(true),
                max_size_kb: Some(10),
                max_objects: Some(-1),
                ..Default::default()
            },
            bucket_quota: Quota {
                enabled: Some(false),
                ..Default::default()
            },
            stats: UserStats {
                size: Some(bytes),
                num_objects: Some(objects),
                ..Default::default()
            },
            ..Default::default()
        };
        let bucket = BucketStats {
            bucket: format!("{}-data", uid),
            owner: uid.to_string(),
            usage: BucketUsage {
                rgw_main: BucketUsageSection {
                    size_actual: Some(bytes),
                    num_objects: Some(objects),
                    ..Default::default()
                },
                rgw_multimeta: None,
            },
            ..Default::default()
        };
        self.users.push((uid.to_string(), user, vec![bucket]));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn failing_user_detail(mut self, uid: &str) -> Self {
        self.detail_failures.insert(uid.to_string());
        self
    }

    pub fn failing_bucket_list(mut self, uid: &str) -> Self {
        self.bucket_failures.insert(uid.to_string());
        self
    }

    pub fn usage_calls(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, uid: &str) -> Result<&(String, User, Vec<BucketStats>)> {
        self.users
            .iter()
            .find(|(id, _, _)| id == uid)
            .ok_or_else(|| AdminError::from_status(404, r#"{"Code":"NoSuchUser"}"#.to_string()))
    }
}

fn unavailable() -> AdminError {
    AdminError::from_status(503, "Service Unavailable".to_string())
}

#[async_trait]
impl AdminApi for FakeAdmin {
    async fn get_usage(&self, _query: &UsageQuery) -> Result<UsageResponse> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        self.usage.clone().ok_or_else(unavailable)
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        if self.listing_fails {
            return Err(unavailable());
        }
        Ok(self.users.iter().map(|(id, _, _)| id.clone()).collect())
    }

    async fn get_user(&self, uid: &str) -> Result<User> {
        if self.detail_failures.contains(uid) {
            return Err(unavailable());
        }
        Ok(self.lookup(uid)?.1.clone())
    }

    async fn list_user_buckets_with_stats(&self, uid: &str) -> Result<Vec<BucketStats>> {
        if self.bucket_failures.contains(uid) {
            return Err(unavailable());
        }
        Ok(self.lookup(uid)?.2.clone())
    }
}
