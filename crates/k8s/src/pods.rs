// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Pod inventory: the source of the node-agent discovery list and of the
//! pid → workload / ip → workload / container-uid → workload resolution
//! tables.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};

use crate::error::Error;

/// The subset of a pod's state the agent and aggregator care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    /// The pod's name.
    pub name: String,
    /// The pod IP, if one has been assigned yet.
    pub ip: Option<String>,
    /// The pod's UID, used to resolve the container-uid cgroup encodings.
    pub uid: Option<String>,
    /// The pod's labels, including the `app` / workload label.
    pub labels: BTreeMap<String, String>,
}

/// Lists pods in `namespace`, optionally scoped by a label selector
/// (e.g. `app=bpf-agent` for node-agent discovery).
pub async fn list_pods(
    client: &kube::Client,
    namespace: &str,
    label_selector: Option<&str>,
) -> Result<Vec<PodInfo>, Error> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let mut params = ListParams::default();
    if let Some(selector) = label_selector {
        params = params.labels(selector);
    }

    let list = api
        .list(&params)
        .await
        .map_err(|source| Error::List {
            resource: "pods",
            namespace: namespace.to_string(),
            source,
        })?;

    Ok(list
        .items
        .into_iter()
        .map(|pod| {
            let name = pod.metadata.name.unwrap_or_default();
            let uid = pod.metadata.uid;
            let labels = pod
                .metadata
                .labels
                .unwrap_or_default()
                .into_iter()
                .collect();
            let ip = pod.status.and_then(|status| status.pod_ip);
            PodInfo {
                name,
                ip,
                uid,
                labels,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_info_carries_workload_label() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "svc-cpu".to_string());
        let pod = PodInfo {
            name: "svc-cpu-abc123".to_string(),
            ip: Some("10.0.0.5".to_string()),
            uid: Some("uid-1".to_string()),
            labels,
        };
        assert_eq!(pod.labels.get("app"), Some(&"svc-cpu".to_string()));
    }
}
