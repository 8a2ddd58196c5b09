//! Timeout-scoped HTTP transports.
//!
//! # Responsibilities
//! - Hand out a `reqwest::Client` whose call timeout matches the request
//! - Reuse one client (and its connection pool) per distinct timeout
//! - Map zero/unset timeouts to a single shared default client
//!
//! # Design Decisions
//! - Instance-scoped `DashMap`, no process-wide state
//! - Lookup first, build outside the shard lock, then insert-if-absent:
//!   a race may build a spare client but only one is ever kept

use std::time::Duration;

use dashmap::DashMap;
use reqwest::Client;

/// Cache of HTTP clients keyed by call timeout.
#[derive(Debug)]
pub struct TransportPool {
    default: Client,
    by_timeout: DashMap<Duration, Client>,
    connect_timeout: Duration,
}

impl TransportPool {
    /// Create a pool whose default client uses `default_timeout`
    /// (zero means no call timeout).
    pub fn new(default_timeout: Duration, connect_timeout: Duration) -> reqwest::Result<Self> {
        let default = build_client(non_zero(default_timeout), connect_timeout)?;
        Ok(Self {
            default,
            by_timeout: DashMap::new(),
            connect_timeout,
        })
    }

    /// Client for a call bounded by `timeout`.
    pub fn client_for(&self, timeout: Option<Duration>) -> reqwest::Result<Client> {
        let Some(timeout) = timeout.and_then(non_zero) else {
            return Ok(self.default.clone());
        };

        if let Some(client) = self.by_timeout.get(&timeout) {
            return Ok(client.value().clone());
        }

        let client = build_client(Some(timeout), self.connect_timeout)?;
        let entry = self.by_timeout.entry(timeout).or_insert(client);
        tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Created timeout-scoped transport");
        Ok(entry.value().clone())
    }

    /// Number of timeout-scoped clients created so far (default excluded).
    pub fn cached(&self) -> usize {
        self.by_timeout.len()
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

fn build_client(timeout: Option<Duration>, connect_timeout: Duration) -> reqwest::Result<Client> {
    let mut builder = Client::builder();
    if !connect_timeout.is_zero() {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
