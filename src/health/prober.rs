//! Host probing.
//!
//! # Responsibilities
//! - Send one lightweight GET to a host's ping path
//! - Bound it by the ping timeout
//! - Reduce every outcome to success/failure; never return an error

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tokio::time;
use uuid::Uuid;

use crate::http::transport::TransportPool;
use crate::http::REQUEST_ID;
use crate::observability::metrics::{MetricsSink, PING_COST, PING_FAILURE};

/// Performs one health probe against a host.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` only when the host answered the probe successfully in time.
    async fn ping(&self, host: &str) -> bool;
}

/// Probes `{schema}://{host}{ping_path}` and expects HTTP 200.
pub struct HttpProber {
    transport: Arc<TransportPool>,
    schema: String,
    ping_path: String,
    timeout: Duration,
    headers: HeaderMap,
    metrics: Arc<dyn MetricsSink>,
}

impl HttpProber {
    pub fn new(
        transport: Arc<TransportPool>,
        schema: impl Into<String>,
        ping_path: impl Into<String>,
        timeout: Duration,
        headers: HeaderMap,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            transport,
            schema: schema.into(),
            ping_path: ping_path.into(),
            timeout,
            headers,
            metrics,
        }
    }

    pub fn url_for(&self, host: &str) -> String {
        format!("{}://{}{}", self.schema, host, self.ping_path)
    }

    /// Customer headers plus a fresh `Request-Id`, which replaces any
    /// configured one.
    fn ping_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Ok(id) = HeaderValue::from_str(&format!("ping_{}", Uuid::new_v4())) {
            headers.insert(REQUEST_ID, id);
        }
        headers
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn ping(&self, host: &str) -> bool {
        let url = self.url_for(host);
        let client = match self.transport.client_for(Some(self.timeout)) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(host = %host, error = %e, "Failed to build ping transport");
                return false;
            }
        };

        let request = client.get(&url).headers(self.ping_headers());

        let started = Instant::now();
        let healthy = match time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => true,
            Ok(Ok(response)) => {
                tracing::warn!(host = %host, status = %response.status(), "Ping failed: unexpected status");
                false
            }
            Ok(Err(e)) => {
                tracing::warn!(host = %host, error = %e, "Ping failed: transport error");
                false
            }
            Err(_) => {
                tracing::warn!(host = %host, timeout_ms = self.timeout.as_millis() as u64, "Ping failed: timeout");
                false
            }
        };

        let tags = [("host", host.to_string())];
        self.metrics
            .timer(PING_COST, started.elapsed().as_millis() as u64, &tags);
        if !healthy {
            self.metrics.counter(PING_FAILURE, 1, &tags);
        }
        healthy
    }
}
