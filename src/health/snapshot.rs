//! Per-cycle ranking of available hosts.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::health::window::FailureWindow;

/// Default failure rate at or above which a host is not available.
pub const DEFAULT_FAILURE_RATE_THRESHOLD: f64 = 0.1;

/// Rates closer than this are treated as equal when ranking.
pub const RATE_EPSILON: f64 = 1e-4;

/// Hosts below the failure-rate threshold, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSnapshot {
    /// `(host, failure_rate)`, ascending by rate; ties keep configured order.
    pub available: Vec<(String, f64)>,
}

impl HealthSnapshot {
    /// Rank `hosts` (in configured order) by the rates in `windows`.
    ///
    /// Hosts missing from `windows` are skipped.
    pub fn compute(hosts: &[String], windows: &HashMap<String, FailureWindow>, threshold: f64) -> Self {
        let mut available: Vec<(String, f64)> = hosts
            .iter()
            .filter_map(|host| {
                let rate = windows.get(host)?.failure_rate();
                (rate < threshold).then(|| (host.clone(), rate))
            })
            .collect();

        if available.len() > 1 {
            // Stable: equal rates keep configured order.
            available.sort_by(|a, b| compare_rates(a.1, b.1));
        }

        Self { available }
    }

    /// Best available host, or the first configured host when none is.
    pub fn select<'a>(&'a self, hosts: &'a [String]) -> Option<&'a str> {
        self.available
            .first()
            .map(|(host, _)| host.as_str())
            .or_else(|| hosts.first().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// Order two failure rates, treating differences within `RATE_EPSILON` as equal.
pub fn compare_rates(a: f64, b: f64) -> Ordering {
    let delta = a - b;
    if delta > RATE_EPSILON {
        Ordering::Greater
    } else if delta < -RATE_EPSILON {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}
