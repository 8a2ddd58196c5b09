//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rec_client_request_cost_ms` (histogram): time until response headers
//! - `rec_client_request_total_cost_ms` (histogram): whole exchange incl. body
//! - `rec_client_common_error` (counter): failures by `type`
//! - `rec_client_ping_cost_ms` (histogram): probe latency per host
//! - `rec_client_ping_failure` (counter): failed probes per host
//! - `rec_client_host_switch` (counter): monitor selection changes
//!
//! # Design Decisions
//! - The dispatcher and monitor talk to a `MetricsSink`, not to a concrete
//!   backend, so embedders can route samples anywhere
//! - The default sink forwards to the `metrics` facade; without an
//!   installed recorder every call is a no-op

use std::net::SocketAddr;

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUEST_COST: &str = "rec_client_request_cost_ms";
pub const REQUEST_TOTAL_COST: &str = "rec_client_request_total_cost_ms";
pub const COMMON_ERROR: &str = "rec_client_common_error";
pub const PING_COST: &str = "rec_client_ping_cost_ms";
pub const PING_FAILURE: &str = "rec_client_ping_failure";
pub const HOST_SWITCH: &str = "rec_client_host_switch";

/// Error `type` tag values for `COMMON_ERROR`.
pub mod error_type {
    pub const REQUEST_TIMEOUT: &str = "request_timeout";
    pub const REQUEST_EXCEPTION: &str = "request_occur_exception";
    pub const STATUS_NOT_OK: &str = "rsp_status_not_ok";
    pub const PARSE_RESPONSE_FAIL: &str = "parse_response_fail";
}

/// Destination for counters and timers emitted by the client.
pub trait MetricsSink: Send + Sync {
    fn counter(&self, key: &str, value: u64, tags: &[(&str, String)]);

    fn timer(&self, key: &str, millis: u64, tags: &[(&str, String)]);
}

/// Forwards samples to the process-wide `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsRecorder;

impl MetricsSink for MetricsRecorder {
    fn counter(&self, key: &str, value: u64, tags: &[(&str, String)]) {
        metrics::counter!(key.to_string(), labels(tags)).increment(value);
    }

    fn timer(&self, key: &str, millis: u64, tags: &[(&str, String)]) {
        metrics::histogram!(key.to_string(), labels(tags)).record(millis as f64);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn counter(&self, _key: &str, _value: u64, _tags: &[(&str, String)]) {}

    fn timer(&self, _key: &str, _millis: u64, _tags: &[(&str, String)]) {}
}

fn labels(tags: &[(&str, String)]) -> Vec<Label> {
    tags.iter()
        .map(|(k, v)| Label::new(k.to_string(), escape_tag_value(v)))
        .collect()
}

/// Replace characters the upstream collector treats as delimiters.
pub fn escape_tag_value(value: &str) -> String {
    value
        .replace('?', "-qu-")
        .replace('&', "-and-")
        .replace('=', "-eq-")
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
