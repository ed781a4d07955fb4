// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-workload metric accumulators and the call-graph edge set.
//!
//! Both live behind a single [`parking_lot::Mutex`] so a scrape's
//! read-and-reset of the metric windows can never interleave with an insert
//! from the tracer reader. The edge set is immortal for the process
//! lifetime and is never reset on scrape, only ever grown.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracescale_common::metrics::{MetricWindow, ScrapeClock};
use tracescale_common::scrape::ScrapeDocument;
use tracescale_common::WorkloadId;

struct Inner {
    metrics: HashMap<WorkloadId, MetricWindow>,
    edges: HashMap<WorkloadId, HashSet<WorkloadId>>,
    clock: ScrapeClock,
}

/// The node agent's mutable aggregation state.
pub struct AgentState {
    inner: Mutex<Inner>,
}

impl AgentState {
    /// Creates empty aggregation state with the scrape clock starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                metrics: HashMap::new(),
                edges: HashMap::new(),
                clock: ScrapeClock::new(),
            }),
        }
    }

    /// Records a completed request's duration for `workload`.
    pub fn record_latency(&self, workload: &WorkloadId, duration_us: u64) {
        let mut inner = self.inner.lock();
        inner
            .metrics
            .entry(workload.clone())
            .or_default()
            .record_latency(duration_us);
    }

    /// Records a syscall returning an error for `workload`.
    pub fn record_error(&self, workload: &WorkloadId) {
        let mut inner = self.inner.lock();
        inner.metrics.entry(workload.clone()).or_default().record_error();
    }

    /// Records an observed `source -> dest` call edge. Self-edges are
    /// rejected; duplicate edges are idempotent (a `HashSet` insert).
    pub fn record_edge(&self, source: &WorkloadId, dest: &WorkloadId) {
        if source == dest {
            return;
        }
        let mut inner = self.inner.lock();
        inner.edges.entry(source.clone()).or_default().insert(dest.clone());
    }

    /// Performs the scrape's atomic read-and-reset: derives
    /// `{latency, rps, error_rate, count}` for every workload that saw
    /// traffic since the last scrape (resetting its accumulator), and
    /// snapshots the (never-reset) edge set as the topology.
    pub fn scrape(&self) -> ScrapeDocument {
        let mut inner = self.inner.lock();
        let elapsed = inner.clock.tick();

        let mut metrics = HashMap::new();
        for (workload, window) in &mut inner.metrics {
            if window.has_traffic() {
                metrics.insert(workload.clone(), window.take(elapsed));
            }
        }

        let topology = inner
            .edges
            .iter()
            .map(|(source, dests)| (source.clone(), dests.iter().cloned().collect()))
            .collect();

        ScrapeDocument { metrics, topology }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new()
    }
}
