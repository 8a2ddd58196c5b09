//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a recommendation-service client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Tenant name, embedded in business URLs.
    pub tenant: String,

    /// Tenant id, sent as `Tenant-Id` and covered by simple signatures.
    pub tenant_id: String,

    /// Signing scheme and its secrets.
    pub auth: AuthConfig,

    /// Deployment region; supplies default hosts and the credential region.
    pub region: Region,

    /// URL scheme for every request and ping.
    pub schema: Schema,

    /// Candidate hosts in preference order. The first is the fallback host.
    /// Empty means the region's defaults.
    pub hosts: Vec<String>,

    /// Customer headers attached to every request and ping.
    pub headers: BTreeMap<String, String>,

    /// Host probing settings.
    pub health_check: HealthCheckConfig,

    /// Transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Configured hosts, or the region's defaults when none are configured.
    pub fn effective_hosts(&self) -> Vec<String> {
        if !self.hosts.is_empty() {
            return self.hosts.clone();
        }
        self.region
            .default_hosts()
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    /// Region used in canonical signatures.
    pub fn credential_region(&self) -> String {
        match &self.auth {
            AuthConfig::Canonical {
                region: Some(region),
                ..
            } if !region.is_empty() => region.clone(),
            _ => self.region.credential_region().to_string(),
        }
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Tenant token with a SHA-256 digest signature.
    Simple { token: String },

    /// Access/secret key pair with canonical-request HMAC signing.
    Canonical {
        access_key: String,
        secret_key: String,
        #[serde(default = "default_service")]
        service: String,
        /// Overrides the region-derived credential region.
        #[serde(default)]
        region: Option<String>,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::Simple {
            token: String::new(),
        }
    }
}

fn default_service() -> String {
    "air".to_string()
}

/// Service deployment region.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Cn,
    Us,
    Sg,
    AirCn,
    AirSg,
    SaasSg,
}

impl Region {
    /// Hosts used when none are configured. Empty for regions without a
    /// public default.
    pub fn default_hosts(self) -> &'static [&'static str] {
        match self {
            Region::Cn => &["rec-b.volcengineapi.com", "rec.volcengineapi.com"],
            Region::Sg => &["tob.sgsnssdk.com"],
            Region::AirCn => &["byteair-api-cn1.snssdk.com"],
            Region::Us | Region::AirSg | Region::SaasSg => &[],
        }
    }

    pub fn credential_region(self) -> &'static str {
        match self {
            Region::Sg | Region::AirSg => "ap-singapore-1",
            Region::Us => "us-east-1",
            Region::Cn | Region::AirCn | Region::SaasSg => "cn-north-1",
        }
    }
}

/// URL scheme.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    Http,
    #[default]
    Https,
}

impl Schema {
    pub fn as_str(self) -> &'static str {
        match self {
            Schema::Http => "http",
            Schema::Https => "https",
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Delay between probe cycles in milliseconds.
    pub ping_interval_ms: u64,

    /// Per-ping timeout in milliseconds.
    pub ping_timeout_ms: u64,

    /// Number of recent outcomes kept per host.
    pub window_size: usize,

    /// Hosts whose failure rate reaches this value are not selected.
    pub failure_rate_threshold: f64,

    /// Path probed on every host.
    pub ping_path: String,
}

impl HealthCheckConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 1000,
            ping_timeout_ms: 300,
            window_size: 60,
            failure_rate_threshold: 0.1,
            ping_path: "/predict/api/ping".to_string(),
        }
    }
}

/// Timeout configuration for business requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Call timeout when a request sets none, in milliseconds.
    pub default_request_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,
}

impl TimeoutConfig {
    pub fn default_request(&self) -> Duration {
        Duration::from_millis(self.default_request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_request_ms: 10_000,
            connect_ms: 3_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
