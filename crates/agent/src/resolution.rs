// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Kernel identifier → workload identity resolution.
//!
//! Two tables are kept: `ip → workload` and `container-uid → workload`,
//! both rebuilt from orchestrator state every 5s and installed atomically so
//! the tracer reader never observes a half-built table. A third table,
//! `pid → workload`, is a pure memoization cache private to the reader task
//! (see [`PidCache`]) and is never rebuilt from scratch.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracescale_common::WorkloadId;

/// Cadence at which the resolution tables are rebuilt from orchestrator state.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// The two orchestrator-derived resolution tables, swapped in as one unit.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTables {
    ip_to_workload: HashMap<String, WorkloadId>,
    uid_to_workload: HashMap<String, WorkloadId>,
}

impl ResolutionTables {
    fn build(
        pods: &[tracescale_k8s::PodInfo],
        services: &[tracescale_k8s::ServiceInfo],
        my_pod_name: Option<&str>,
    ) -> Self {
        let mut ip_to_workload = HashMap::new();
        let mut uid_to_workload = HashMap::new();

        for pod in pods {
            if my_pod_name.is_some_and(|name| name == pod.name) {
                continue;
            }
            let Some(app) = pod.labels.get("app") else {
                continue;
            };
            let Ok(workload) = WorkloadId::new(app.as_str()) else {
                continue;
            };

            if let Some(ip) = &pod.ip {
                let _ = ip_to_workload.insert(ip.clone(), workload.clone());
            }
            if let Some(uid) = &pod.uid {
                for key in uid_encodings(uid) {
                    let _ = uid_to_workload.insert(key, workload.clone());
                }
            }
        }

        for svc in services {
            let app = svc.labels.get("app").cloned().unwrap_or_else(|| svc.name.clone());
            let Ok(workload) = WorkloadId::new(app) else {
                continue;
            };
            if let Some(cluster_ip) = &svc.cluster_ip {
                let _ = ip_to_workload.insert(cluster_ip.clone(), workload);
            }
        }

        Self {
            ip_to_workload,
            uid_to_workload,
        }
    }

    /// Resolves a destination IP (with any `::ffff:` v4-in-v6 prefix already
    /// stripped by the caller) to the workload fronting it.
    #[must_use]
    pub fn resolve_ip(&self, ip: &str) -> Option<&WorkloadId> {
        self.ip_to_workload.get(ip)
    }

    /// Scans `cgroup_content` for any known container UID encoding as a
    /// case-insensitive substring, returning the first match.
    #[must_use]
    pub fn resolve_cgroup_content(&self, cgroup_content: &str) -> Option<&WorkloadId> {
        let haystack = cgroup_content.to_lowercase();
        self.uid_to_workload
            .iter()
            .find(|(uid, _)| haystack.contains(uid.to_lowercase().as_str()))
            .map(|(_, workload)| workload)
    }
}

/// The three cgroup-path encodings a pod UID may appear as: as-is,
/// dash-to-underscore, and dashes stripped.
fn uid_encodings(uid: &str) -> [String; 3] {
    [uid.to_string(), uid.replace('-', "_"), uid.replace('-', "")]
}

/// Runs forever, rebuilding and installing the resolution tables every
/// [`REFRESH_INTERVAL`]. Orchestrator errors are logged and the previous
/// tables are kept, per the agent's failure semantics.
pub async fn refresh_loop(
    client: kube::Client,
    namespace: String,
    my_pod_name: Option<String>,
    tables: Arc<ArcSwap<ResolutionTables>>,
) {
    loop {
        let pods = tracescale_k8s::pods::list_pods(&client, &namespace, None).await;
        let services = tracescale_k8s::services::list_services(&client, &namespace).await;

        match (pods, services) {
            (Ok(pods), Ok(services)) => {
                let next = ResolutionTables::build(&pods, &services, my_pod_name.as_deref());
                tracing::debug!(
                    ips = next.ip_to_workload.len(),
                    uids = next.uid_to_workload.len(),
                    "resolution tables refreshed"
                );
                tables.store(Arc::new(next));
            }
            (pods, services) => {
                if let Err(err) = pods {
                    tracing::warn!(%err, "failed to list pods; keeping previous resolution tables");
                }
                if let Err(err) = services {
                    tracing::warn!(%err, "failed to list services; keeping previous resolution tables");
                }
            }
        }

        tokio::time::sleep(REFRESH_INTERVAL).await;
    }
}

/// Memoized `pid → workload` lookups, backed by `/proc/{pid}/cgroup`.
///
/// A miss is memoized as `None` (the `UNKNOWN` sentinel): pids don't collide
/// within an agent's lifetime, so a stale miss is harmless and re-reading
/// `/proc` for a pid that will never resolve would only waste syscalls.
#[derive(Debug, Default)]
pub struct PidCache {
    cache: HashMap<u32, Option<WorkloadId>>,
}

impl PidCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `pid` to a workload, consulting (and populating) the cache.
    pub fn resolve(&mut self, pid: u32, tables: &ResolutionTables) -> Option<WorkloadId> {
        if let Some(cached) = self.cache.get(&pid) {
            return cached.clone();
        }

        let resolved = fs::read_to_string(format!("/proc/{pid}/cgroup"))
            .ok()
            .and_then(|content| tables.resolve_cgroup_content(&content).cloned());
        let _ = self.cache.insert(pid, resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(s: &str) -> WorkloadId {
        WorkloadId::new(s).unwrap()
    }

    #[test]
    fn uid_encodings_cover_dash_underscore_and_stripped_forms() {
        let encodings = uid_encodings("ab-cd-ef");
        assert_eq!(encodings, ["ab-cd-ef", "ab_cd_ef", "abcdef"]);
    }

    #[test]
    fn resolve_cgroup_content_matches_any_known_encoding_case_insensitively() {
        let mut uid_to_workload = HashMap::new();
        uid_to_workload.insert("ab_cd_ef".to_string(), workload("svc-cpu"));
        let tables = ResolutionTables {
            ip_to_workload: HashMap::new(),
            uid_to_workload,
        };

        let content = "0::/kubepods/burstable/podAB-CD-EF/abc123";
        assert_eq!(tables.resolve_cgroup_content(content), Some(&workload("svc-cpu")));
    }

    #[test]
    fn resolve_ip_prefers_pod_ip_and_falls_back_to_service_cluster_ip() {
        let pods = vec![tracescale_k8s::PodInfo {
            name: "svc-cpu-0".to_string(),
            ip: Some("10.0.0.5".to_string()),
            uid: Some("uid-1".to_string()),
            labels: [("app".to_string(), "svc-cpu".to_string())].into_iter().collect(),
        }];
        let services = vec![tracescale_k8s::ServiceInfo {
            name: "svc-db".to_string(),
            cluster_ip: Some("10.0.0.9".to_string()),
            labels: [("app".to_string(), "svc-db".to_string())].into_iter().collect(),
        }];

        let tables = ResolutionTables::build(&pods, &services, None);
        assert_eq!(tables.resolve_ip("10.0.0.5"), Some(&workload("svc-cpu")));
        assert_eq!(tables.resolve_ip("10.0.0.9"), Some(&workload("svc-db")));
        assert_eq!(tables.resolve_ip("10.0.0.99"), None);
    }

    #[test]
    fn build_skips_its_own_pod() {
        let pods = vec![tracescale_k8s::PodInfo {
            name: "bpf-agent-xyz".to_string(),
            ip: Some("10.0.0.1".to_string()),
            uid: Some("uid-self".to_string()),
            labels: [("app".to_string(), "bpf-agent".to_string())].into_iter().collect(),
        }];
        let tables = ResolutionTables::build(&pods, &[], Some("bpf-agent-xyz"));
        assert_eq!(tables.resolve_ip("10.0.0.1"), None);
    }

    #[test]
    fn pid_cache_memoizes_misses_as_unknown() {
        let tables = ResolutionTables::default();
        let mut cache = PidCache::new();
        // pid 1 almost certainly won't contain any of our (empty) uid set,
        // and this path is not expected to exist under test sandboxes either
        // way; either way the miss must be memoized.
        let first = cache.resolve(999_999, &tables);
        let second = cache.resolve(999_999, &tables);
        assert_eq!(first, second);
        assert!(cache.cache.contains_key(&999_999));
    }
}
