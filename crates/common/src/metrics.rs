// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The per-workload metric accumulator and its scrape-time derived form.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Clamp applied to the elapsed time between two scrapes so a degenerate
/// back-to-back scrape can't divide by (near) zero.
const MIN_SCRAPE_INTERVAL: Duration = Duration::from_secs(1);

/// A mutable per-workload accumulator.
///
/// `errors` is incremented by `ERR` tracer events independently of `count`
/// (incremented only by `LAT` events), so the two can diverge mid-window: a
/// workload can see more failed syscalls than completed requests in the same
/// window. `take` enforces `count >= errors >= 0` on the reported window by
/// clamping `errors` to `count` there; the raw, unclamped counters may
/// briefly disagree between scrapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricWindow {
    sum_us: u64,
    count: u64,
    errors: u64,
}

impl MetricWindow {
    /// Records a completed request's duration.
    pub fn record_latency(&mut self, duration_us: u64) {
        self.sum_us += duration_us;
        self.count += 1;
    }

    /// Records a syscall returning an error for this workload.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Whether any traffic was observed since the last reset.
    #[must_use]
    pub fn has_traffic(&self) -> bool {
        self.count > 0
    }

    /// Derives `{latency_ms, rps, error_rate, count}` from the accumulator
    /// over the elapsed wall-clock interval, then resets the accumulator to
    /// zero. This is the "read and reset" step that must happen atomically
    /// with respect to concurrent inserts (see the crate's caller for the
    /// lock that guarantees this).
    pub fn take(&mut self, elapsed: Duration) -> DerivedMetric {
        let elapsed = elapsed.max(MIN_SCRAPE_INTERVAL);
        let secs = elapsed.as_secs_f64();

        let latency_ms = if self.count == 0 {
            0.0
        } else {
            (self.sum_us as f64 / self.count as f64) / 1000.0
        };
        // Clamp to enforce `count >= errors >= 0` on the reported window even
        // though the two counters are incremented independently (see the
        // struct doc comment).
        let reported_errors = self.errors.min(self.count);
        let derived = DerivedMetric {
            latency_ms,
            rps: self.count as f64 / secs,
            error_rate: reported_errors as f64 / secs,
            count: self.count,
        };

        self.sum_us = 0;
        self.count = 0;
        self.errors = 0;

        derived
    }
}

/// The scrape-time derived view of a [`MetricWindow`], as reported over the
/// wire and as fused by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    /// Mean request latency in milliseconds over the scrape window.
    #[serde(rename = "latency")]
    pub latency_ms: f64,
    /// Requests per second over the scrape window.
    pub rps: f64,
    /// Errored syscalls per second over the scrape window.
    pub error_rate: f64,
    /// Number of completed requests observed in the scrape window.
    pub count: u64,
}

/// Tracks the wall-clock time of the last scrape so the next one can compute
/// `Δt`. Not part of [`MetricWindow`] itself: one `ScrapeClock` is shared
/// across all workloads on a node agent, since `Δt` is a property of the
/// scrape, not of any one workload.
#[derive(Debug)]
pub struct ScrapeClock {
    last_scrape: Instant,
}

impl ScrapeClock {
    /// Starts a clock as of now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_scrape: Instant::now(),
        }
    }

    /// Returns the elapsed time since the last call to this method (or since
    /// construction, for the first call), and resets the clock to now.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_scrape);
        self.last_scrape = now;
        elapsed
    }
}

impl Default for ScrapeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_derives_to_zero_latency() {
        let mut window = MetricWindow::default();
        let derived = window.take(Duration::from_secs(2));
        assert_eq!(derived.count, 0);
        assert_eq!(derived.latency_ms, 0.0);
        assert_eq!(derived.rps, 0.0);
    }

    #[test]
    fn take_resets_the_accumulator() {
        let mut window = MetricWindow::default();
        window.record_latency(5_000);
        window.record_latency(15_000);
        window.record_error();

        let derived = window.take(Duration::from_secs(2));
        assert_eq!(derived.count, 2);
        assert_eq!(derived.latency_ms, 5.0); // (5000+15000)/2 / 1000
        assert_eq!(derived.rps, 1.0);
        assert_eq!(derived.error_rate, 0.5);

        assert!(!window.has_traffic());
        let second = window.take(Duration::from_secs(2));
        assert_eq!(second.count, 0);
    }

    #[test]
    fn errors_in_excess_of_count_are_clamped_on_take() {
        let mut window = MetricWindow::default();
        window.record_latency(1_000);
        window.record_error();
        window.record_error();
        window.record_error();

        // 1 completed request, 3 errored syscalls: errors is clamped to
        // count (1) so the reported error_rate reflects at most 1 error.
        let derived = window.take(Duration::from_secs(1));
        assert_eq!(derived.count, 1);
        assert_eq!(derived.error_rate, 1.0);
    }

    #[test]
    fn scrape_interval_is_clamped_to_avoid_blowup() {
        let mut window = MetricWindow::default();
        window.record_latency(1_000);
        let derived = window.take(Duration::from_millis(10));
        // Clamped to 1s, not 10ms, so rps isn't inflated 100x.
        assert_eq!(derived.rps, 1.0);
    }
}
