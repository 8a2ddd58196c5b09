//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! RecClient::new
//!     → HostHealthMonitor subscribes to Shutdown, spawns probe task
//!
//! RecClient::shutdown / drop
//!     → Shutdown::trigger → probe task leaves its loop
//!     → in-flight business calls are untouched
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
