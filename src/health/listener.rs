//! Host-change observers.
//!
//! The monitor only knows that someone may care about a switch; it hands
//! every registered listener the same event and does not know what they do
//! with it (regenerate URLs, log, update a dashboard).

use std::fmt;

/// Emitted when the monitor's selected host changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostChange {
    pub previous: String,
    pub current: String,
}

impl fmt::Display for HostChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.previous, self.current)
    }
}

/// Subscriber to host switches.
///
/// Called from the monitor task; implementations must not block.
pub trait HostListener: Send + Sync {
    fn on_host_change(&self, change: &HostChange);
}

impl<F> HostListener for F
where
    F: Fn(&HostChange) + Send + Sync,
{
    fn on_host_change(&self, change: &HostChange) {
        self(change)
    }
}
