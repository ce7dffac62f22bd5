//! Admin API client
//!
//! Read-only wrapper over the gateway's `/admin` REST resources. Requests are
//! signed with SigV4 and decoded into the models in [`crate::types`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{AdminError, Result};
use crate::signer::{canonical_query, Credentials, Signer, SigningRequest, EMPTY_PAYLOAD_SHA256};
use crate::types::{BucketStats, UsageQuery, UsageResponse, User};

/// Region placed in the credential scope when none is configured
pub const DEFAULT_REGION: &str = "default";

/// Per-request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read operations the exporter needs from the gateway
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Usage entries matching `query`
    async fn get_usage(&self, query: &UsageQuery) -> Result<UsageResponse>;

    /// Identifiers of every user known to the gateway
    async fn list_user_ids(&self) -> Result<Vec<String>>;

    /// Detail (quotas and totals) of one user
    async fn get_user(&self, uid: &str) -> Result<User>;

    /// Buckets owned by `uid`, with storage statistics
    async fn list_user_buckets_with_stats(&self, uid: &str) -> Result<Vec<BucketStats>>;
}

/// Admin client configuration
#[derive(Debug, Clone)]
pub struct AdminClientConfig {
    /// Gateway base URL, e.g. `https://rgw.example.com:8443`
    pub endpoint: String,
    /// Admin credentials
    pub credentials: Credentials,
    /// SigV4 region
    pub region: String,
    /// Skip TLS certificate verification
    pub insecure_skip_verify: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AdminClientConfig {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            region: DEFAULT_REGION.to_string(),
            insecure_skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }
}

/// reqwest-backed admin API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base: Url,
    signer: Signer,
}

impl AdminClient {
    /// Build a client, validating the endpoint
    pub fn new(config: AdminClientConfig) -> Result<Self> {
        let base = parse_endpoint(&config.endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| AdminError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base,
            signer: Signer::new(config.credentials, config.region, "s3"),
        })
    }

    /// Base URL requests are resolved against
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of an admin resource with its query string
    fn resource_url(&self, resource: &str, params: &[(String, String)]) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/admin{}", self.base.path().trim_end_matches('/'), resource);
        url.set_path(&path);
        url.set_query(Some(&canonical_query(params)));
        url
    }

    #[instrument(skip(self, params), level = "debug")]
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T> {
        params.push(("format".to_string(), "json".to_string()));
        let url = self.resource_url(resource, &params);

        let now = Utc::now();
        let headers = vec![
            ("host".to_string(), authority(&url)),
            ("x-amz-content-sha256".to_string(), EMPTY_PAYLOAD_SHA256.to_string()),
            ("x-amz-date".to_string(), Signer::amz_date(now)),
        ];
        let authorization = self.signer.authorization(
            &SigningRequest {
                method: "GET",
                canonical_uri: url.path(),
                query: &params,
                headers: &headers,
                payload_hash: EMPTY_PAYLOAD_SHA256,
            },
            now,
        )?;

        // reqwest derives Host from the URL
        let mut request = self.http.get(url).header(AUTHORIZATION, authorization);
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Admin API response");

        if !status.is_success() {
            return Err(AdminError::from_status(status.as_u16(), body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn get_usage(&self, query: &UsageQuery) -> Result<UsageResponse> {
        self.get_json("/usage", query.to_params()).await
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        self.get_json("/metadata/user", Vec::new()).await
    }

    async fn get_user(&self, uid: &str) -> Result<User> {
        self.get_json(
            "/user",
            vec![
                ("uid".to_string(), uid.to_string()),
                ("stats".to_string(), "true".to_string()),
            ],
        )
        .await
    }

    async fn list_user_buckets_with_stats(&self, uid: &str) -> Result<Vec<BucketStats>> {
        self.get_json(
            "/bucket",
            vec![
                ("uid".to_string(), uid.to_string()),
                ("stats".to_string(), "true".to_string()),
            ],
        )
        .await
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AdminError::InvalidEndpoint(format!(
                "unsupported scheme '{}' in {}",
                other, raw
            )))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AdminError::InvalidEndpoint(format!("missing host in {}", raw)));
    }
    if url.query().is_some() {
        return Err(AdminError::InvalidEndpoint(format!("query string not allowed in {}", raw)));
    }
    Ok(url)
}

/// `host[:port]` as sent in the Host header; default ports are omitted
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request with `status` and `body`, returning the raw request head
    async fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (addr, handle)
    }

    fn client_for(addr: SocketAddr) -> AdminClient {
        AdminClient::new(AdminClientConfig::new(
            format!("http://{}", addr),
            Credentials::new("admin", "secret"),
        ))
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_endpoints() {
        let creds = || Credentials::new("a", "b");
        for raw in ["ftp://rgw.local", "not a url", "http://rgw.local/?x=1"] {
            let result = AdminClient::new(AdminClientConfig::new(raw, creds()));
            assert!(
                matches!(result, Err(AdminError::InvalidEndpoint(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_resource_url_keeps_base_path() {
        let client = AdminClient::new(AdminClientConfig::new(
            "https://rgw.example.com:8443/gateway/",
            Credentials::new("a", "b"),
        ))
        .unwrap();
        let url = client.resource_url(
            "/user",
            &[("uid".to_string(), "alice".to_string())],
        );
        assert_eq!(url.as_str(), "https://rgw.example.com:8443/gateway/admin/user?uid=alice");
        assert_eq!(authority(&url), "rgw.example.com:8443");
    }

    #[test]
    fn test_authority_omits_default_port() {
        let url = Url::parse("https://rgw.example.com:443/admin").unwrap();
        assert_eq!(authority(&url), "rgw.example.com");
    }

    #[tokio::test]
    async fn test_list_user_ids_sends_signed_request() {
        let (addr, server) = serve_once("200 OK", r#"["alice","bob"]"#).await;
        let client = client_for(addr);

        let users = client.list_user_ids().await.unwrap();
        assert_eq!(users, vec!["alice".to_string(), "bob".to_string()]);

        let head = server.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /admin/metadata/user?format=json http/1.1"));
        assert!(head.contains("authorization: aws4-hmac-sha256 credential=admin/"));
        assert!(head.contains("/default/s3/aws4_request"));
        assert!(head.contains("x-amz-date: "));
        assert!(head.contains("x-amz-content-sha256: "));
    }

    #[tokio::test]
    async fn test_get_user_requests_stats() {
        let (addr, server) = serve_once(
            "200 OK",
            r#"{"user_id":"alice","user_quota":{"enabled":true,"max_size_kb":10},"bucket_quota":{},"stats":{"size":1,"num_objects":1}}"#,
        )
        .await;
        let client = client_for(addr);

        let user = client.get_user("alice").await.unwrap();
        assert_eq!(user.user_id, "alice");
        assert_eq!(user.user_quota.max_size_kb, Some(10));
        assert_eq!(user.stats.num_objects, Some(1));

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /admin/user?format=json&stats=true&uid=alice HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let (addr, _server) = serve_once("404 Not Found", r#"{"Code":"NoSuchUser"}"#).await;
        let client = client_for(addr);

        let err = client.get_user("ghost").await.unwrap_err();
        match err {
            AdminError::Status { status, ref code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("NoSuchUser"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (addr, _server) = serve_once("200 OK", r#"{"entries": 12}"#).await;
        let client = client_for(addr);

        let err = client.get_usage(&UsageQuery::entries_only()).await.unwrap_err();
        assert!(matches!(err, AdminError::Decode(_)));
    }
}
