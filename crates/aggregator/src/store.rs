// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The fused view: a TTL-bounded store owned by the merge loop, published to
//! HTTP readers as a lock-free snapshot.
//!
//! The merge loop is the only writer. Each tick it refreshes the entries it
//! saw and prunes anything that has gone [`FUSED_VIEW_TTL`] without a
//! refresh, then installs a fresh [`ScrapeDocument`] snapshot via
//! [`arc_swap::ArcSwap`] so `GET /api/graph` never blocks on the merge loop
//! and never observes a half-merged view. `GET /api/reset` both clears the
//! published snapshot immediately and flags the merge loop's own TTL maps
//! for a hard clear before its next tick, so a stale entry can't reappear
//! after a reset just because its TTL hadn't expired yet.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracescale_common::scrape::ScrapeDocument;
use tracescale_common::ttl::TtlMap;
use tracescale_common::WorkloadId;

/// How long a workload may go unreported before it is dropped from the
/// fused view.
pub const FUSED_VIEW_TTL: Duration = Duration::from_secs(30);

/// Owned by the merge loop: the TTL-tracked metrics and topology maps that
/// back each tick's published snapshot.
pub struct MergeState {
    metrics: TtlMap<WorkloadId, tracescale_common::metrics::DerivedMetric>,
    topology: TtlMap<WorkloadId, HashSet<WorkloadId>>,
}

impl MergeState {
    /// Creates an empty merge state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: TtlMap::new(),
            topology: TtlMap::new(),
        }
    }

    /// Clears both TTL maps immediately, discarding anything not yet expired.
    pub fn clear(&mut self) {
        self.metrics = TtlMap::new();
        self.topology = TtlMap::new();
    }

    /// Refreshes this tick's merged metrics and topology, prunes anything
    /// that has aged out, and returns a snapshot ready to publish.
    pub fn apply_tick(
        &mut self,
        metrics: HashMap<WorkloadId, tracescale_common::metrics::DerivedMetric>,
        topology: HashMap<WorkloadId, HashSet<WorkloadId>>,
    ) -> ScrapeDocument {
        for (workload, metric) in metrics {
            self.metrics.refresh(workload, metric);
        }
        for (source, dests) in topology {
            self.topology.refresh(source, dests);
        }
        self.metrics.prune(FUSED_VIEW_TTL);
        self.topology.prune(FUSED_VIEW_TTL);

        ScrapeDocument {
            metrics: self.metrics.snapshot(),
            topology: self
                .topology
                .snapshot()
                .into_iter()
                .map(|(source, dests)| (source, dests.into_iter().collect()))
                .collect(),
        }
    }
}

impl Default for MergeState {
    fn default() -> Self {
        Self::new()
    }
}

/// The handle shared between the merge loop and the HTTP layer: a lock-free
/// read path over the published snapshot, plus a reset flag the merge loop
/// observes at the top of each tick.
#[derive(Clone)]
pub struct Store {
    view: Arc<ArcSwap<ScrapeDocument>>,
    reset_requested: Arc<AtomicBool>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view: Arc::new(ArcSwap::from_pointee(ScrapeDocument::default())),
            reset_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publishes a freshly merged snapshot for HTTP readers.
    pub fn publish(&self, snapshot: ScrapeDocument) {
        self.view.store(Arc::new(snapshot));
    }

    /// Returns the most recently published snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<ScrapeDocument> {
        self.view.load_full()
    }

    /// `GET /api/reset`: clears the published view immediately and asks the
    /// merge loop to clear its own TTL maps before building the next tick's
    /// snapshot.
    pub fn reset(&self) {
        self.view.store(Arc::new(ScrapeDocument::default()));
        self.reset_requested.store(true, Ordering::SeqCst);
    }

    /// Consumed by the merge loop at the top of each tick: `true` at most
    /// once per `reset()` call.
    pub fn take_reset_request(&self) -> bool {
        self.reset_requested.swap(false, Ordering::SeqCst)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
