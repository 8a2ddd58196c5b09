//! Sliding window of probe outcomes.
//!
//! Fixed-capacity ring of the last `N` outcomes for one host. Every slot
//! starts as a success so a freshly added host is not disqualified by its
//! first failed probe.

/// Default number of outcomes kept per host.
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Ring buffer of boolean probe outcomes with an O(1) failure rate.
#[derive(Debug, Clone)]
pub struct FailureWindow {
    slots: Box<[bool]>,
    /// Next slot to overwrite (the oldest outcome).
    cursor: usize,
    /// Number of `false` entries currently in `slots`.
    failures: usize,
}

impl FailureWindow {
    /// Create a window holding `size` outcomes, all seeded as successes.
    /// A zero size is treated as one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: vec![true; size].into_boxed_slice(),
            cursor: 0,
            failures: 0,
        }
    }

    /// Record one outcome, evicting the oldest.
    pub fn put(&mut self, success: bool) {
        let evicted = std::mem::replace(&mut self.slots[self.cursor], success);
        match (evicted, success) {
            (true, false) => self.failures += 1,
            (false, true) => self.failures -= 1,
            _ => {}
        }
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Fraction of the window that failed, in `[0, 1]`.
    pub fn failure_rate(&self) -> f64 {
        self.failures as f64 / self.slots.len() as f64
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for FailureWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_optimistic() {
        let window = FailureWindow::new(10);
        assert_eq!(window.failure_rate(), 0.0);
        assert_eq!(window.capacity(), 10);
    }

    #[test]
    fn test_failure_rate_counts_recent_failures() {
        let mut window = FailureWindow::new(10);
        for _ in 0..3 {
            window.put(false);
        }
        for _ in 0..4 {
            window.put(true);
        }
        assert_eq!(window.failures(), 3);
        assert_eq!(window.failure_rate(), 3.0 / 10.0);
    }

    #[test]
    fn test_failures_are_evicted() {
        let mut window = FailureWindow::new(4);
        window.put(false);
        window.put(false);
        assert_eq!(window.failures(), 2);

        // Four successes push both failures out of the ring.
        for _ in 0..4 {
            window.put(true);
        }
        assert_eq!(window.failures(), 0);
        assert_eq!(window.failure_rate(), 0.0);
    }

    #[test]
    fn test_overwriting_failure_with_failure_keeps_count() {
        let mut window = FailureWindow::new(2);
        for _ in 0..7 {
            window.put(false);
        }
        assert_eq!(window.failures(), 2);
        assert_eq!(window.failure_rate(), 1.0);
    }

    #[test]
    fn test_count_matches_ring_contents() {
        let mut window = FailureWindow::new(7);
        let pattern = [true, false, false, true, false, true, true, false, false, false, true];
        for (i, outcome) in pattern.iter().cycle().take(100).enumerate() {
            window.put(*outcome);
            let expected = window.slots.iter().filter(|s| !**s).count();
            assert_eq!(window.failures(), expected, "mismatch after put #{i}");
        }
    }

    #[test]
    fn test_k_failures_within_window() {
        let n = 60;
        for k in 0..=n {
            let mut window = FailureWindow::new(n);
            // Old history that will be fully evicted.
            for _ in 0..n {
                window.put(false);
            }
            for i in 0..n {
                window.put(i >= k);
            }
            assert_eq!(window.failure_rate(), k as f64 / n as f64);
        }
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let mut window = FailureWindow::new(0);
        window.put(false);
        assert_eq!(window.failure_rate(), 1.0);
    }
}
