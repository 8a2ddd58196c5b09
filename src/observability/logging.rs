//! Structured logging.
//!
//! The library only emits `tracing` events. `init` installs a fmt
//! subscriber for binaries and tests that want to see them; `RUST_LOG`
//! takes precedence over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rec_client={level},rec_probe={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
