// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The scaling decision algorithm: violation detection, depth-1 root-cause
//! attribution, and the deterministic replica calculation.
//!
//! Everything in this module is pure — no I/O, no clock reads beyond a
//! caller-supplied `Instant` — so the end-to-end scenarios below can be
//! expressed as exact unit tests without a live aggregator or orchestrator.

use tracescale_common::metrics::DerivedMetric;
use tracescale_common::scrape::{Metrics, Topology};
use tracescale_common::WorkloadId;
use tracescale_k8s::SloRecord;

/// The noise floor below which latency is not trusted enough to act on.
pub const RPS_FLOOR: f64 = 1.0;

/// One workload whose observed latency exceeds its declared SLO, already
/// resolved to the workload that should actually be scaled for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The workload whose latency violated its own SLO.
    pub source: WorkloadId,
    /// The workload the controller should act on: `source` itself, or an
    /// unhealthy managed immediate dependency it was attributed to.
    pub target: WorkloadId,
    /// `target`'s observed latency this tick.
    pub target_latency_ms: f64,
    /// `target`'s declared SLO.
    pub target_slo: SloRecord,
}

/// Whether `metric` violates `slo`: above the rps noise floor and over the
/// declared latency bound.
#[must_use]
pub fn violates(metric: &DerivedMetric, slo: &SloRecord) -> bool {
    metric.rps >= RPS_FLOOR && metric.latency_ms > slo.slo_latency_ms
}

/// Walks `violating`'s immediate dependencies in `topology`, returning the
/// first managed, unhealthy child found (iteration order of the stored edge
/// set — no deep search, no cycle guard needed at depth 1) or `violating`
/// itself if none qualifies.
fn attribute(
    violating: &WorkloadId,
    violating_metric: DerivedMetric,
    violating_slo: SloRecord,
    topology: &Topology,
    metrics: &Metrics,
    slos: &std::collections::HashMap<WorkloadId, SloRecord>,
) -> (WorkloadId, DerivedMetric, SloRecord) {
    if let Some(children) = topology.get(violating) {
        for child in children {
            if let (Some(&slo), Some(&metric)) = (slos.get(child), metrics.get(child)) {
                if metric.latency_ms > slo.slo_latency_ms {
                    return (child.clone(), metric, slo);
                }
            }
        }
    }
    (violating.clone(), violating_metric, violating_slo)
}

/// Scans every workload in `metrics` for an SLO violation, in `WorkloadId`
/// order (deterministic, independent of `HashMap` iteration), and resolves
/// each one's attributed scaling target.
#[must_use]
pub fn detect_violations(
    metrics: &Metrics,
    topology: &Topology,
    slos: &std::collections::HashMap<WorkloadId, SloRecord>,
) -> Vec<Violation> {
    let mut candidates: Vec<(&WorkloadId, SloRecord, DerivedMetric)> = metrics
        .iter()
        .filter_map(|(workload, metric)| {
            let slo = *slos.get(workload)?;
            violates(metric, &slo).then_some((workload, slo, *metric))
        })
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));

    candidates
        .into_iter()
        .map(|(source, slo, metric)| {
            let (target, target_metric, target_slo) =
                attribute(source, metric, slo, topology, metrics, slos);
            Violation {
                source: source.clone(),
                target,
                target_latency_ms: target_metric.latency_ms,
                target_slo,
            }
        })
        .collect()
}

/// Computes the target replica count for a workload currently at `current`
/// replicas and observing `latency_ms`, per a linear queueing approximation:
/// `new = clamp(⌈current × latency/slo⌉, min, max)`.
#[must_use]
pub fn target_replicas(current: i32, latency_ms: f64, slo: &SloRecord) -> i32 {
    let ratio = latency_ms / slo.slo_latency_ms;
    let ideal = (f64::from(current) * ratio).ceil();
    (ideal as i32).clamp(slo.min_replicas, slo.max_replicas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn workload(s: &str) -> WorkloadId {
        WorkloadId::new(s).unwrap()
    }

    fn slo(latency_ms: f64, min: i32, max: i32) -> SloRecord {
        SloRecord {
            slo_latency_ms: latency_ms,
            min_replicas: min,
            max_replicas: max,
        }
    }

    fn metric(latency_ms: f64, rps: f64) -> DerivedMetric {
        DerivedMetric {
            latency_ms,
            rps,
            error_rate: 0.0,
            count: (rps * 2.0) as u64,
        }
    }

    /// Seed scenario 1: healthy baseline, no violation.
    #[test]
    fn healthy_workload_is_not_a_violation() {
        let a = workload("svc-a");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(5.0, 50.0));
        let mut slos = HashMap::new();
        slos.insert(a, slo(30.0, 1, 5));

        let violations = detect_violations(&metrics, &Topology::new(), &slos);
        assert!(violations.is_empty());
    }

    /// Seed scenario 2: simple violation, no topology.
    #[test]
    fn simple_violation_computes_the_documented_ideal_replica_count() {
        let a = workload("svc-a");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(90.0, 5.0));
        let mut slos = HashMap::new();
        slos.insert(a.clone(), slo(30.0, 1, 10));

        let violations = detect_violations(&metrics, &Topology::new(), &slos);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target, a);

        let new = target_replicas(2, violations[0].target_latency_ms, &violations[0].target_slo);
        assert_eq!(new, 6); // ceil(2 * 90/30) = 6
    }

    /// Seed scenario 3: low-traffic suppression — no violation regardless of latency.
    #[test]
    fn low_rps_suppresses_violation_regardless_of_latency() {
        let a = workload("svc-a");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(500.0, 0.5));
        let mut slos = HashMap::new();
        slos.insert(a, slo(30.0, 1, 10));

        assert!(detect_violations(&metrics, &Topology::new(), &slos).is_empty());
    }

    /// Seed scenario 4: root-cause attribution redirects the scale to the unhealthy child.
    #[test]
    fn attribution_redirects_to_unhealthy_managed_child() {
        let a = workload("svc-a");
        let b = workload("svc-b");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(200.0, 10.0));
        metrics.insert(b.clone(), metric(150.0, 10.0));
        let mut slos = HashMap::new();
        slos.insert(a.clone(), slo(30.0, 1, 10));
        slos.insert(b.clone(), slo(30.0, 1, 10));
        let mut topology = Topology::new();
        topology.insert(a.clone(), vec![b.clone()]);

        let violations = detect_violations(&metrics, &topology, &slos);
        let a_violation = violations.iter().find(|v| v.source == a).unwrap();
        assert_eq!(a_violation.target, b);
    }

    /// Seed scenario 5: a healthy child protects the caller from blame.
    #[test]
    fn healthy_child_does_not_steal_the_blame() {
        let a = workload("svc-a");
        let b = workload("svc-b");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(200.0, 10.0));
        metrics.insert(b.clone(), metric(5.0, 10.0));
        let mut slos = HashMap::new();
        slos.insert(a.clone(), slo(30.0, 1, 10));
        slos.insert(b.clone(), slo(30.0, 1, 10));
        let mut topology = Topology::new();
        topology.insert(a.clone(), vec![b]);

        let violations = detect_violations(&metrics, &topology, &slos);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target, a);
    }

    /// Seed scenario 6 (second half): a degenerate ratio clamps to `max_replicas`.
    #[test]
    fn ideal_replica_count_is_clamped_to_max() {
        let new = target_replicas(6, 90.0, &slo(30.0, 1, 10));
        assert_eq!(new, 10); // ceil(6 * 3) = 18, clamped to 10
    }

    #[test]
    fn ideal_replica_count_is_clamped_to_min() {
        let new = target_replicas(4, 1.0, &slo(30.0, 2, 10));
        assert_eq!(new, 2); // ceil(4 * 1/30) = 1, clamped up to min 2
    }

    #[test]
    fn unmanaged_workload_without_an_slo_is_never_a_violation() {
        let a = workload("svc-a");
        let mut metrics = Metrics::new();
        metrics.insert(a, metric(500.0, 100.0));
        assert!(detect_violations(&metrics, &Topology::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn attribution_only_considers_immediate_children_not_transitive_ones() {
        let a = workload("svc-a");
        let b = workload("svc-b");
        let c = workload("svc-c");
        let mut metrics = Metrics::new();
        metrics.insert(a.clone(), metric(200.0, 10.0));
        metrics.insert(b.clone(), metric(5.0, 10.0)); // healthy direct child
        metrics.insert(c.clone(), metric(500.0, 10.0)); // unhealthy grandchild
        let mut slos = HashMap::new();
        slos.insert(a.clone(), slo(30.0, 1, 10));
        slos.insert(b.clone(), slo(30.0, 1, 10));
        slos.insert(c.clone(), slo(30.0, 1, 10));
        let mut topology = Topology::new();
        topology.insert(a.clone(), vec![b.clone()]);
        topology.insert(b, vec![c]);

        let violations = detect_violations(&metrics, &topology, &slos);
        // svc-b is healthy so it never appears as a source; svc-a blames
        // nobody downstream (its only child, svc-b, is healthy) and is
        // scaled itself, even though svc-c (two hops away) is unhealthy.
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target, a);
    }
}
