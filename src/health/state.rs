//! Monitor lifecycle state.
//!
//! # State Transitions
//! ```text
//! construction, < 2 hosts:  Disabled
//! construction, >= 2 hosts: Running   (probe task spawned)
//! shutdown():               Running  → Stopped
//!                           Disabled → Stopped (nothing to cancel)
//!                           Stopped  → Stopped (no-op)
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Monitor lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Disabled = 0,
    Running = 1,
    Stopped = 2,
}

impl From<u8> for MonitorState {
    fn from(val: u8) -> Self {
        match val {
            1 => MonitorState::Running,
            2 => MonitorState::Stopped,
            _ => MonitorState::Disabled,
        }
    }
}

/// Atomically updated `MonitorState`.
#[derive(Debug)]
pub struct AtomicMonitorState(AtomicU8);

impl AtomicMonitorState {
    pub fn new(state: MonitorState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> MonitorState {
        self.0.load(Ordering::Acquire).into()
    }

    /// Move to `Stopped`, returning the state it replaced.
    pub fn stop(&self) -> MonitorState {
        self.0.swap(MonitorState::Stopped as u8, Ordering::AcqRel).into()
    }
}
