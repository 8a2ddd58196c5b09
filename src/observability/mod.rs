//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher / monitor / prober produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → MetricsSink calls (metrics.rs, forwarded to the `metrics` facade)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing subscribers/exporters is the
//!   embedding application's call (or the `rec-probe` binary's)
//! - Request ID is attached to every request log line
//! - Metric tag values are escaped for the upstream collector

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsRecorder, MetricsSink, NoopMetrics};
