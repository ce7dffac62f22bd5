//! Exporter configuration
//!
//! Read from the environment, optionally seeded from a `.env` file. Empty
//! values count as unset.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use radosgw_admin::{AdminClientConfig, Credentials, DEFAULT_REGION};

use crate::error::{ExporterError, Result};

pub const DEFAULT_STORE: &str = "us-east-1";
pub const DEFAULT_PORT: u16 = 9242;
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(ExporterError::Config(format!(
                "LOG_FORMAT must be 'json' or 'text', got '{}'",
                other
            ))),
        }
    }
}

impl LogFormat {
    /// Best-effort format for logging before the full configuration is valid
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("LOG_FORMAT")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

/// Exporter configuration
#[derive(Clone)]
pub struct ExporterConfig {
    /// Gateway base URL
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Value of the `store` label
    pub store: String,
    pub listen_address: String,
    pub port: u16,
    pub insecure_skip_verify: bool,
    /// SigV4 region
    pub region: String,
    /// Per-request admin API timeout
    pub timeout: Duration,
    /// Users resolved concurrently during a pass
    pub user_concurrency: usize,
    pub log_format: LogFormat,
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("store", &self.store)
            .field("listen_address", &self.listen_address)
            .field("port", &self.port)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("user_concurrency", &self.user_concurrency)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ExporterConfig {
    /// Load configuration from `.env` and the process environment
    ///
    /// The only place `.env` is read; callers that need the environment
    /// afterwards see its values already applied.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = get("RADOSGW_ENDPOINT");
        let access_key = get("ACCESS_KEY");
        let secret_key = get("SECRET_KEY");
        let (endpoint, access_key, secret_key) = match (endpoint, access_key, secret_key) {
            (Some(endpoint), Some(access_key), Some(secret_key)) => {
                (endpoint, access_key, secret_key)
            }
            (endpoint, access_key, secret_key) => {
                let missing: Vec<&str> = [
                    ("RADOSGW_ENDPOINT", endpoint.is_none()),
                    ("ACCESS_KEY", access_key.is_none()),
                    ("SECRET_KEY", secret_key.is_none()),
                ]
                .iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| *name)
                .collect();
                return Err(ExporterError::Config(format!(
                    "Required environment variables not set: {}",
                    missing.join(", ")
                )));
            }
        };

        let user_concurrency = parse_or(get("USER_CONCURRENCY"), "USER_CONCURRENCY", 1usize)?;
        if user_concurrency == 0 {
            return Err(ExporterError::Config(
                "USER_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let timeout_secs = parse_or(
            get("RADOSGW_TIMEOUT_SECS"),
            "RADOSGW_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ExporterError::Config(
                "RADOSGW_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            store: get("STORE").unwrap_or_else(|| DEFAULT_STORE.to_string()),
            listen_address: get("LISTEN_ADDRESS")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
            port: parse_or(get("METRICS_PORT"), "METRICS_PORT", DEFAULT_PORT)?,
            insecure_skip_verify: match get("INSECURE_SKIP_VERIFY") {
                Some(raw) => parse_bool("INSECURE_SKIP_VERIFY", &raw)?,
                None => false,
            },
            region: get("RADOSGW_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            user_concurrency,
            log_format: match get("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => LogFormat::default(),
            },
        })
    }

    /// Socket address the metrics server binds to
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen_address.parse().map_err(|_| {
            ExporterError::Config(format!(
                "LISTEN_ADDRESS must be an IP address, got '{}'",
                self.listen_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn admin_client_config(&self) -> AdminClientConfig {
        AdminClientConfig::new(
            self.endpoint.clone(),
            Credentials::new(self.access_key.clone(), self.secret_key.clone()),
        )
        .with_region(self.region.clone())
        .with_timeout(self.timeout)
        .with_insecure_skip_verify(self.insecure_skip_verify)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ExporterError::Config(format!("{} has an invalid value '{}'", name, raw))),
        None => Ok(default),
    }
}

/// Accepts the usual spellings: 1/0, t/f, true/false in any case
fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(ExporterError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}
