//! Recommendation-service client core.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller bytes / JSON
//!            │
//!            ▼
//!     ┌─────────────┐   url_for    ┌─────────────┐   HostChange   ┌─────────────────┐
//!     │  RecClient  │─────────────▶│ ServiceUrls │◀───────────────│HostHealthMonitor│
//!     └──────┬──────┘              └─────────────┘                │  FailureWindow  │
//!            │                                                    │  per host       │
//!            ▼                                                    └────────┬────────┘
//!     ┌───────────────────┐   sign   ┌───────────────┐                     │ ping
//!     │ RequestDispatcher │─────────▶│ RequestSigner │                     ▼
//!     │ gzip, headers,    │          └───────────────┘               ┌───────────┐
//!     │ classify, gunzip  │─────────────────────────────────────────▶│ Transport │
//!     └───────────────────┘                                          │   Pool    │
//!                                                                    └───────────┘
//! ```
//!
//! The monitor is the only background task. Every business call runs on the
//! caller's task and reads the current host through an atomic swap.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod urls;

pub use client::{BuildError, ClientBuilder, ProbeReport, RecClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use health::{HostChange, HostHealthMonitor, HostListener, MonitorState};
pub use http::{RequestDispatcher, RequestOptions};
pub use lifecycle::Shutdown;
