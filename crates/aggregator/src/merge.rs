// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Fuses a tick's scrape documents into one workload → metric map and one
//! source → destinations topology map.
//!
//! **Merge policy:** count-weighted averaging of latency, summed
//! `rps`/`error_rate`/`count`. A node agent's scrape response already
//! carries `latency_ms` rather than the raw `sum_us`, so the weighted
//! average is reconstructed as `Σ(latency_ms_i * count_i) / Σcount_i`,
//! which is algebraically identical to `Σsum_us / Σcount` since
//! `latency_ms_i * count_i == sum_us_i / 1000`.

use std::collections::{HashMap, HashSet};

use tracescale_common::metrics::DerivedMetric;
use tracescale_common::scrape::Metrics;
use tracescale_common::WorkloadId;

#[derive(Default)]
struct MetricAccumulator {
    weighted_latency_sum: f64,
    rps: f64,
    error_rate: f64,
    count: u64,
}

impl MetricAccumulator {
    fn add(&mut self, metric: &DerivedMetric) {
        self.weighted_latency_sum += metric.latency_ms * metric.count as f64;
        self.rps += metric.rps;
        self.error_rate += metric.error_rate;
        self.count += metric.count;
    }

    fn finish(self) -> DerivedMetric {
        let latency_ms = if self.count == 0 {
            0.0
        } else {
            self.weighted_latency_sum / self.count as f64
        };
        DerivedMetric {
            latency_ms,
            rps: self.rps,
            error_rate: self.error_rate,
            count: self.count,
        }
    }
}

/// Merges this tick's scrape documents, returning the fused metrics and the
/// fused (de-duplicated) topology for every workload reported by at least
/// one scrape this tick.
pub fn merge_tick(documents: &[tracescale_common::scrape::ScrapeDocument]) -> (Metrics, HashMap<WorkloadId, HashSet<WorkloadId>>) {
    let mut metric_acc: HashMap<WorkloadId, MetricAccumulator> = HashMap::new();
    let mut topology_acc: HashMap<WorkloadId, HashSet<WorkloadId>> = HashMap::new();

    for doc in documents {
        for (workload, metric) in &doc.metrics {
            metric_acc
                .entry(workload.clone())
                .or_default()
                .add(metric);
        }
        for (source, dests) in &doc.topology {
            topology_acc
                .entry(source.clone())
                .or_default()
                .extend(dests.iter().cloned());
        }
    }

    let metrics = metric_acc
        .into_iter()
        .map(|(workload, acc)| (workload, acc.finish()))
        .collect();

    (metrics, topology_acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracescale_common::scrape::ScrapeDocument;

    fn workload(s: &str) -> WorkloadId {
        WorkloadId::new(s).unwrap()
    }

    fn metric(latency_ms: f64, rps: f64, error_rate: f64, count: u64) -> DerivedMetric {
        DerivedMetric {
            latency_ms,
            rps,
            error_rate,
            count,
        }
    }

    #[test]
    fn single_agent_passes_through_unchanged() {
        let mut doc = ScrapeDocument::default();
        doc.metrics.insert(workload("svc-cpu"), metric(5.0, 50.0, 0.0, 100));
        let (metrics, _) = merge_tick(std::slice::from_ref(&doc));
        let merged = metrics.get(&workload("svc-cpu")).unwrap();
        assert_eq!(merged.latency_ms, 5.0);
        assert_eq!(merged.rps, 50.0);
        assert_eq!(merged.count, 100);
    }

    #[test]
    fn two_agents_combine_by_count_weighted_latency_and_summed_rps() {
        let mut a = ScrapeDocument::default();
        a.metrics.insert(workload("svc-cpu"), metric(10.0, 30.0, 1.0, 30));
        let mut b = ScrapeDocument::default();
        b.metrics.insert(workload("svc-cpu"), metric(20.0, 10.0, 0.0, 10));

        let (metrics, _) = merge_tick(&[a, b]);
        let merged = metrics.get(&workload("svc-cpu")).unwrap();

        // (10*30 + 20*10) / 40 = 12.5
        assert_eq!(merged.latency_ms, 12.5);
        assert_eq!(merged.rps, 40.0);
        assert_eq!(merged.error_rate, 1.0);
        assert_eq!(merged.count, 40);
    }

    #[test]
    fn topology_unions_across_agents() {
        let mut a = ScrapeDocument::default();
        a.topology.insert(workload("svc-cpu"), vec![workload("svc-db")]);
        let mut b = ScrapeDocument::default();
        b.topology.insert(workload("svc-cpu"), vec![workload("svc-cache")]);

        let (_, topology) = merge_tick(&[a, b]);
        let dests = topology.get(&workload("svc-cpu")).unwrap();
        assert_eq!(dests.len(), 2);
        assert!(dests.contains(&workload("svc-db")));
        assert!(dests.contains(&workload("svc-cache")));
    }

    #[test]
    fn workload_reported_by_no_agent_this_tick_is_absent() {
        let (metrics, _) = merge_tick(&[]);
        assert!(metrics.is_empty());
    }
}
