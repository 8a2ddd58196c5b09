//! Host health subsystem.
//!
//! # Data Flow
//! ```text
//! Probe cycle (monitor.rs), every ping interval:
//!     prober.rs pings all hosts concurrently
//!     → window.rs records one outcome per host
//!     → snapshot.rs ranks hosts below the failure-rate threshold
//!     → best host (or first configured host) selected
//!     → on change: atomic swap, HostChange to every listener.rs observer
//!
//! State machine (state.rs):
//!     Disabled (< 2 hosts) | Running → Stopped
//! ```
//!
//! # Design Decisions
//! - Probe failures are data, never errors
//! - Windows start all-success so a new host is not dropped on one failure
//! - Near-equal rates (within 1e-4) keep configured order, which stops
//!   selection from flapping between equally healthy hosts
//! - The selected host is published through `ArcSwap`; readers never lock

pub mod listener;
pub mod monitor;
pub mod prober;
pub mod snapshot;
pub mod state;
pub mod window;

pub use listener::{HostChange, HostListener};
pub use monitor::{HostHealthMonitor, MonitorBuilder, MonitorError};
pub use prober::{HttpProber, Prober};
pub use snapshot::HealthSnapshot;
pub use state::MonitorState;
pub use window::FailureWindow;
