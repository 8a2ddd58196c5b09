//! Background host selection.
//!
//! # Responsibilities
//! - Probe every candidate host once per interval
//! - Keep one `FailureWindow` per host and rank hosts each cycle
//! - Publish the selected host atomically and notify listeners on change
//! - Survive any failure inside a cycle

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::validation::MAX_WINDOW_SIZE;
use crate::config::HealthCheckConfig;
use crate::health::listener::{HostChange, HostListener};
use crate::health::prober::Prober;
use crate::health::snapshot::HealthSnapshot;
use crate::health::state::{AtomicMonitorState, MonitorState};
use crate::health::window::FailureWindow;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{MetricsSink, NoopMetrics, HOST_SWITCH};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("at least one host is required")]
    NoHosts,

    #[error("window_size {0} is outside 1..={MAX_WINDOW_SIZE}")]
    InvalidWindow(usize),

    #[error("failure_rate_threshold {0} is outside (0, 1]")]
    InvalidThreshold(f64),

    #[error("host monitoring requires a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Owns host selection for one client.
///
/// With fewer than two hosts there is nothing to choose between and the
/// monitor stays `Disabled`. Otherwise a probe task runs until `shutdown`
/// or drop.
pub struct HostHealthMonitor {
    hosts: Arc<[String]>,
    current: Arc<ArcSwap<String>>,
    snapshot: Arc<ArcSwap<HealthSnapshot>>,
    state: AtomicMonitorState,
    shutdown: Shutdown,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Collects optional collaborators before the probe task starts.
pub struct MonitorBuilder {
    hosts: Vec<String>,
    config: HealthCheckConfig,
    prober: Arc<dyn Prober>,
    listeners: Vec<Arc<dyn HostListener>>,
    metrics: Arc<dyn MetricsSink>,
}

impl MonitorBuilder {
    pub fn listener(mut self, listener: Arc<dyn HostListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the monitor and, with two or more hosts, spawn the probe task
    /// on the current Tokio runtime. The first cycle runs immediately.
    pub fn start(self) -> Result<HostHealthMonitor, MonitorError> {
        let first = self.hosts.first().cloned().ok_or(MonitorError::NoHosts)?;
        // Past the window bound adjacent rates fall inside the ranking
        // epsilon and the comparator is no longer a total order.
        let window = self.config.window_size;
        if window == 0 || window > MAX_WINDOW_SIZE {
            return Err(MonitorError::InvalidWindow(window));
        }
        let threshold = self.config.failure_rate_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(MonitorError::InvalidThreshold(threshold));
        }
        let hosts: Arc<[String]> = self.hosts.into();
        let current = Arc::new(ArcSwap::from_pointee(first));
        let snapshot = Arc::new(ArcSwap::from_pointee(HealthSnapshot::default()));
        let shutdown = Shutdown::new();

        if hosts.len() < 2 {
            tracing::info!(host = %hosts[0], "Single host configured, health monitor disabled");
            return Ok(HostHealthMonitor {
                hosts,
                current,
                snapshot,
                state: AtomicMonitorState::new(MonitorState::Disabled),
                shutdown,
                task: Mutex::new(None),
            });
        }

        let runtime = tokio::runtime::Handle::try_current()?;
        let windows = hosts
            .iter()
            .map(|h| (h.clone(), FailureWindow::new(self.config.window_size)))
            .collect();

        let probe_loop = ProbeLoop {
            hosts: Arc::clone(&hosts),
            windows,
            threshold: self.config.failure_rate_threshold,
            interval: self.config.ping_interval(),
            prober: self.prober,
            listeners: self.listeners,
            metrics: self.metrics,
            current: Arc::clone(&current),
            snapshot: Arc::clone(&snapshot),
        };

        tracing::info!(
            hosts = ?hosts,
            interval_ms = self.config.ping_interval_ms,
            timeout_ms = self.config.ping_timeout_ms,
            window = self.config.window_size,
            threshold = self.config.failure_rate_threshold,
            "Health monitor starting"
        );

        // Subscribe before spawning so an immediate shutdown is not missed.
        let rx = shutdown.subscribe();
        let handle = runtime.spawn(probe_loop.run(rx));

        Ok(HostHealthMonitor {
            hosts,
            current,
            snapshot,
            state: AtomicMonitorState::new(MonitorState::Running),
            shutdown,
            task: Mutex::new(Some(handle)),
        })
    }
}

impl HostHealthMonitor {
    pub fn builder(
        hosts: Vec<String>,
        config: &HealthCheckConfig,
        prober: Arc<dyn Prober>,
    ) -> MonitorBuilder {
        MonitorBuilder {
            hosts,
            config: config.clone(),
            prober,
            listeners: Vec::new(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// The selected host. Never empty; falls back to the first host.
    pub fn current_host(&self) -> Arc<String> {
        self.current.load_full()
    }

    /// Ranking from the most recent completed cycle.
    pub fn snapshot(&self) -> Arc<HealthSnapshot> {
        self.snapshot.load_full()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn state(&self) -> MonitorState {
        self.state.load()
    }

    /// Stop probing. A cycle already in flight may finish; no new cycle
    /// starts. Calling this again, or on a disabled monitor, does nothing.
    pub fn shutdown(&self) {
        match self.state.stop() {
            MonitorState::Running => {
                self.shutdown.trigger();
                tracing::info!("Health monitor stopping");
            }
            MonitorState::Disabled | MonitorState::Stopped => {}
        }
    }

    /// Wait for the probe task to exit. Returns immediately when there is
    /// no task or it was already awaited.
    pub async fn stopped(&self) {
        let handle = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }
}

impl Drop for HostHealthMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for HostHealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHealthMonitor")
            .field("hosts", &self.hosts)
            .field("current", &self.current.load_full())
            .field("state", &self.state())
            .finish()
    }
}

/// State owned exclusively by the probe task.
struct ProbeLoop {
    hosts: Arc<[String]>,
    windows: HashMap<String, FailureWindow>,
    threshold: f64,
    interval: Duration,
    prober: Arc<dyn Prober>,
    listeners: Vec<Arc<dyn HostListener>>,
    metrics: Arc<dyn MetricsSink>,
    current: Arc<ArcSwap<String>>,
    snapshot: Arc<ArcSwap<HealthSnapshot>>,
}

impl ProbeLoop {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(panic) = AssertUnwindSafe(self.cycle()).catch_unwind().await {
                        tracing::error!(reason = panic_message(&*panic), "Probe cycle panicked");
                    }
                }
            }
        }
    }

    async fn cycle(&mut self) {
        let prober = &self.prober;
        let outcomes = join_all(self.hosts.iter().map(|host| prober.ping(host))).await;

        for (host, healthy) in self.hosts.iter().zip(outcomes) {
            if let Some(window) = self.windows.get_mut(host) {
                window.put(healthy);
            }
        }

        let snapshot = HealthSnapshot::compute(&self.hosts, &self.windows, self.threshold);
        let selected = snapshot.select(&self.hosts).map(str::to_owned);
        tracing::trace!(available = ?snapshot.available, "Probe cycle complete");
        self.snapshot.store(Arc::new(snapshot));

        if let Some(selected) = selected {
            if **self.current.load() != selected {
                self.switch(selected);
            }
        }
    }

    fn switch(&self, selected: String) {
        let previous = self.current.swap(Arc::new(selected.clone()));
        let change = HostChange {
            previous: previous.as_ref().clone(),
            current: selected,
        };

        tracing::info!(from = %change.previous, to = %change.current, "Selected host changed");
        self.metrics.counter(
            HOST_SWITCH,
            1,
            &[("from", change.previous.clone()), ("to", change.current.clone())],
        );

        for listener in &self.listeners {
            let notify = AssertUnwindSafe(|| listener.on_host_change(&change));
            if let Err(panic) = std::panic::catch_unwind(notify) {
                tracing::error!(
                    change = %change,
                    reason = panic_message(&*panic),
                    "Host listener panicked"
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers pings from a mutable health table.
    #[derive(Default)]
    struct ScriptedProber {
        unhealthy: Mutex<Vec<String>>,
        panic_on: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn fail(&self, host: &str) {
            self.unhealthy.lock().unwrap().push(host.to_string());
        }

        fn recover(&self, host: &str) {
            self.unhealthy.lock().unwrap().retain(|h| h != host);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn ping(&self, host: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let panic_host = self.panic_on.lock().unwrap().clone();
            if panic_host.as_deref() == Some(host) {
                panic!("scripted panic for {host}");
            }
            !self.unhealthy.lock().unwrap().iter().any(|h| h == host)
        }
    }

    fn config() -> HealthCheckConfig {
        HealthCheckConfig {
            ping_interval_ms: 10,
            ping_timeout_ms: 5,
            window_size: 10,
            failure_rate_threshold: 0.1,
            ..Default::default()
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
        check()
    }

    #[tokio::test]
    async fn test_single_host_is_disabled() {
        let prober = Arc::new(ScriptedProber::default());
        let monitor = HostHealthMonitor::builder(hosts(&["a"]), &config(), prober.clone())
            .start()
            .unwrap();

        assert_eq!(monitor.state(), MonitorState::Disabled);
        assert_eq!(monitor.current_host().as_str(), "a");
        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(prober.calls(), 0);

        monitor.shutdown();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        monitor.stopped().await;
    }

    #[test]
    fn test_no_hosts_rejected() {
        let prober = Arc::new(ScriptedProber::default());
        let err = HostHealthMonitor::builder(Vec::new(), &config(), prober)
            .start()
            .unwrap_err();
        assert!(matches!(err, MonitorError::NoHosts));
    }

    #[test]
    fn test_out_of_range_window_rejected() {
        let prober = Arc::new(ScriptedProber::default());
        for window_size in [0, MAX_WINDOW_SIZE + 1, 20_000] {
            let cfg = HealthCheckConfig {
                window_size,
                ..config()
            };
            let err = HostHealthMonitor::builder(hosts(&["a", "b"]), &cfg, prober.clone())
                .start()
                .unwrap_err();
            assert!(matches!(err, MonitorError::InvalidWindow(n) if n == window_size));
        }
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let prober = Arc::new(ScriptedProber::default());
        for failure_rate_threshold in [0.0, -0.5, 1.5, f64::NAN] {
            let cfg = HealthCheckConfig {
                failure_rate_threshold,
                ..config()
            };
            let err = HostHealthMonitor::builder(hosts(&["a", "b"]), &cfg, prober.clone())
                .start()
                .unwrap_err();
            assert!(matches!(err, MonitorError::InvalidThreshold(_)));
        }
    }

    #[tokio::test]
    async fn test_largest_window_still_ranks() {
        let prober = Arc::new(ScriptedProber::default());
        prober.fail("a");
        let cfg = HealthCheckConfig {
            window_size: MAX_WINDOW_SIZE,
            failure_rate_threshold: 1.0,
            ..config()
        };
        let monitor = HostHealthMonitor::builder(hosts(&["a", "b"]), &cfg, prober.clone())
            .start()
            .unwrap();
        assert!(eventually(|| *monitor.current_host() == "b").await);
        monitor.shutdown();
        monitor.stopped().await;
    }

    #[test]
    fn test_requires_runtime_for_multiple_hosts() {
        let prober = Arc::new(ScriptedProber::default());
        let err = HostHealthMonitor::builder(hosts(&["a", "b"]), &config(), prober)
            .start()
            .unwrap_err();
        assert!(matches!(err, MonitorError::NoRuntime(_)));
    }

    #[tokio::test]
    async fn test_failover_and_fallback() {
        let prober = Arc::new(ScriptedProber::default());
        let changes = Arc::new(Mutex::new(Vec::new()));
        let seen = changes.clone();

        prober.fail("a");
        let monitor = HostHealthMonitor::builder(hosts(&["a", "b"]), &config(), prober.clone())
            .listener(Arc::new(move |change: &HostChange| {
                seen.lock().unwrap().push(change.clone());
            }))
            .start()
            .unwrap();
        assert_eq!(monitor.state(), MonitorState::Running);

        assert!(eventually(|| monitor.current_host().as_str() == "b").await);
        assert_eq!(
            changes.lock().unwrap()[0],
            HostChange {
                previous: "a".into(),
                current: "b".into()
            }
        );

        // Every host failing: fall back to the first configured host.
        prober.fail("b");
        assert!(eventually(|| monitor.current_host().as_str() == "a").await);
        assert!(monitor.snapshot().is_empty());

        monitor.shutdown();
        monitor.stopped().await;
    }

    #[tokio::test]
    async fn test_no_flap_while_worse() {
        let prober = Arc::new(ScriptedProber::default());
        prober.fail("a");
        let monitor = HostHealthMonitor::builder(hosts(&["a", "b"]), &config(), prober.clone())
            .start()
            .unwrap();

        assert!(eventually(|| monitor.current_host().as_str() == "b").await);
        let calls = prober.calls();
        assert!(eventually(|| prober.calls() >= calls + 10).await);
        assert_eq!(monitor.current_host().as_str(), "b");

        // Once A's window is clean again it ties with B and wins on order.
        prober.recover("a");
        assert!(eventually(|| monitor.current_host().as_str() == "a").await);

        monitor.shutdown();
        monitor.stopped().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let prober = Arc::new(ScriptedProber::default());
        let monitor = HostHealthMonitor::builder(hosts(&["a", "b"]), &config(), prober.clone())
            .start()
            .unwrap();
        assert!(eventually(|| prober.calls() >= 2).await);

        monitor.shutdown();
        monitor.shutdown();
        monitor.stopped().await;
        monitor.stopped().await;
        assert_eq!(monitor.state(), MonitorState::Stopped);

        let after = prober.calls();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(prober.calls(), after);
    }

    #[tokio::test]
    async fn test_cycle_panics_are_contained() {
        let prober = Arc::new(ScriptedProber::default());
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();

        *prober.panic_on.lock().unwrap() = Some("b".to_string());
        prober.fail("a");
        let monitor = HostHealthMonitor::builder(hosts(&["a", "b"]), &config(), prober.clone())
            .listener(Arc::new(|_: &HostChange| panic!("listener failure")))
            .listener(Arc::new(move |_: &HostChange| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .start()
            .unwrap();

        // Panicking pings do not kill the loop.
        let calls = prober.calls();
        assert!(eventually(|| prober.calls() >= calls + 6).await);
        assert_eq!(monitor.current_host().as_str(), "a");

        // A panicking listener does not stop the next one.
        *prober.panic_on.lock().unwrap() = None;
        assert!(eventually(|| monitor.current_host().as_str() == "b").await);
        assert!(eventually(|| notified.load(Ordering::SeqCst) == 1).await);

        monitor.shutdown();
        monitor.stopped().await;
    }
}
