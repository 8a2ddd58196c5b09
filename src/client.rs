//! Client composition.
//!
//! `RecClient` wires one signer, one transport pool, one dispatcher, one
//! health monitor and one URL set together. Product-specific clients wrap
//! a `RecClient` and call it; nothing here is meant to be subclassed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::auth::{CanonicalSigner, Credential, RequestSigner, SimpleSigner};
use crate::config::{validate_config, AuthConfig, ClientConfig, ConfigError};
use crate::error::ClientResult;
use crate::health::listener::HostListener;
use crate::health::monitor::{HostHealthMonitor, MonitorError};
use crate::health::prober::{HttpProber, Prober};
use crate::health::state::MonitorState;
use crate::http::{header_map, RequestDispatcher, RequestOptions, TransportPool};
use crate::observability::metrics::{MetricsRecorder, MetricsSink};
use crate::urls::{ServiceUrls, UrlSet};

/// Errors raised while constructing a client.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid customer headers: {0}")]
    Headers(String),

    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Result of probing one host outside the monitor.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub host: String,
    pub healthy: bool,
    pub elapsed: Duration,
}

pub struct ClientBuilder {
    config: ClientConfig,
    metrics: Arc<dyn MetricsSink>,
    listeners: Vec<Arc<dyn HostListener>>,
}

impl ClientBuilder {
    /// Replace the default `metrics`-crate recorder.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Additional observer of host switches.
    pub fn listener(mut self, listener: Arc<dyn HostListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Validate the configuration and start host monitoring.
    ///
    /// With two or more hosts this must run inside a Tokio runtime.
    pub fn build(self) -> Result<RecClient, BuildError> {
        let config = self.config;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let hosts = config.effective_hosts();
        let customer_headers = header_map(&config.headers).map_err(BuildError::Headers)?;
        let signer = signer_for(&config);
        let auth_mode = signer.mode();

        let transport = Arc::new(TransportPool::new(
            config.timeouts.default_request(),
            config.timeouts.connect(),
        )?);
        let prober = Arc::new(HttpProber::new(
            Arc::clone(&transport),
            config.schema.as_str(),
            config.health_check.ping_path.clone(),
            config.health_check.ping_timeout(),
            customer_headers.clone(),
            Arc::clone(&self.metrics),
        ));

        let first = hosts.first().cloned().unwrap_or_default();
        let urls = Arc::new(ServiceUrls::new(
            config.schema,
            config.tenant.clone(),
            config.health_check.ping_path.clone(),
            &first,
        ));

        let mut monitor = HostHealthMonitor::builder(hosts, &config.health_check, prober.clone())
            .metrics(Arc::clone(&self.metrics))
            .listener(urls.clone());
        for listener in self.listeners {
            monitor = monitor.listener(listener);
        }
        let monitor = monitor.start()?;

        let dispatcher = RequestDispatcher::new(
            config.tenant.clone(),
            config.tenant_id.clone(),
            customer_headers,
            signer,
            transport,
            self.metrics,
        );

        tracing::info!(
            tenant = %config.tenant,
            hosts = ?monitor.hosts(),
            auth = auth_mode,
            "Client ready"
        );

        Ok(RecClient {
            config,
            dispatcher,
            monitor,
            prober,
            urls,
        })
    }
}

/// A recommendation-service client.
pub struct RecClient {
    config: ClientConfig,
    dispatcher: RequestDispatcher,
    monitor: HostHealthMonitor,
    prober: Arc<HttpProber>,
    urls: Arc<ServiceUrls>,
}

impl RecClient {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            metrics: Arc::new(MetricsRecorder),
            listeners: Vec::new(),
        }
    }

    pub fn new(config: ClientConfig) -> Result<Self, BuildError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn current_host(&self) -> Arc<String> {
        self.monitor.current_host()
    }

    pub fn urls(&self) -> Arc<UrlSet> {
        self.urls.current()
    }

    /// `{schema}://{current host}{path}`
    pub fn url_for(&self, path: &str) -> String {
        self.urls.url_for(path)
    }

    pub fn monitor(&self) -> &HostHealthMonitor {
        &self.monitor
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// POST raw bytes to `path` on the current host.
    pub async fn request(
        &self,
        path: &str,
        body: &[u8],
        content_type: &str,
        options: &RequestOptions,
    ) -> ClientResult<Vec<u8>> {
        let url = self.url_for(path);
        self.dispatcher.dispatch(&url, body, content_type, options).await
    }

    /// POST `request` as JSON to `path` on the current host.
    pub async fn request_json<Req, Resp>(
        &self,
        path: &str,
        request: &Req,
        options: &RequestOptions,
    ) -> ClientResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url_for(path);
        self.dispatcher.dispatch_json(&url, request, options).await
    }

    /// Ping every configured host once, concurrently.
    pub async fn probe_hosts(&self) -> Vec<ProbeReport> {
        let probes = self.monitor.hosts().iter().map(|host| async move {
            let started = Instant::now();
            let healthy = self.prober.ping(host).await;
            ProbeReport {
                host: host.clone(),
                healthy,
                elapsed: started.elapsed(),
            }
        });
        join_all(probes).await
    }

    /// Stop host monitoring. In-flight requests are unaffected.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }

    /// Wait until the monitor task has exited.
    pub async fn stopped(&self) {
        self.monitor.stopped().await;
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.state() == MonitorState::Running
    }
}

impl std::fmt::Debug for RecClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecClient")
            .field("tenant", &self.config.tenant)
            .field("monitor", &self.monitor)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

fn signer_for(config: &ClientConfig) -> RequestSigner {
    match &config.auth {
        AuthConfig::Simple { token } => {
            RequestSigner::Simple(SimpleSigner::new(config.tenant_id.clone(), token.clone()))
        }
        AuthConfig::Canonical {
            access_key,
            secret_key,
            service,
            ..
        } => RequestSigner::Canonical(CanonicalSigner::new(Credential::new(
            access_key.clone(),
            secret_key.clone(),
            service.clone(),
            config.credential_region(),
        ))),
    }
}
