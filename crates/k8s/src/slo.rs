// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Reads `ServiceSLO` objects: the declarative per-workload scaling targets
//! the controller evaluates every decision tick.
//!
//! The object's group/version is configured at runtime, so this goes
//! through `kube`'s dynamic-object API rather than a `#[derive(CustomResource)]`
//! type, whose generated `Api<K>` pins the group/version at compile time.

use std::collections::HashMap;

use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde::Deserialize;

use tracescale_common::WorkloadId;

use crate::error::Error;

const PLURAL: &str = "serviceslos";
const KIND: &str = "ServiceSLO";

fn default_slo_latency_ms() -> f64 {
    30.0
}

fn default_min_replicas() -> i32 {
    1
}

fn default_max_replicas() -> i32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSloSpec {
    target_deployment: String,
    #[serde(rename = "sloLatency", default = "default_slo_latency_ms")]
    slo_latency_ms: f64,
    #[serde(default = "default_min_replicas")]
    min_replicas: i32,
    #[serde(default = "default_max_replicas")]
    max_replicas: i32,
}

/// The resolved scaling target for one workload, defaults already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SloRecord {
    /// The latency SLO in milliseconds. Defaults to 30.
    pub slo_latency_ms: f64,
    /// The minimum replica count the controller will ever scale down to. Defaults to 1.
    pub min_replicas: i32,
    /// The maximum replica count the controller will ever scale up to. Defaults to 10.
    pub max_replicas: i32,
}

/// Lists `ServiceSLO` objects in `namespace`, keyed by the workload they target.
///
/// A 404 from the orchestrator (the CRD is not installed in this cluster) is
/// treated as "no workloads are managed", not an error: the controller is
/// expected to run fine in a cluster that hasn't adopted SLOs yet.
pub async fn list_service_slos(
    client: &kube::Client,
    namespace: &str,
    group: &str,
    version: &str,
) -> Result<HashMap<WorkloadId, SloRecord>, Error> {
    let gvk = GroupVersionKind::gvk(group, version, KIND);
    let resource = ApiResource::from_gvk_with_plural(&gvk, PLURAL);
    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, &resource);

    let list = match api.list(&ListParams::default()).await {
        Ok(list) => list,
        Err(kube::Error::Api(response)) if response.code == 404 => {
            return Ok(HashMap::new());
        }
        Err(source) => {
            return Err(Error::List {
                resource: "serviceslos",
                namespace: namespace.to_string(),
                source,
            });
        }
    };

    let mut by_workload = HashMap::with_capacity(list.items.len());
    for item in list.items {
        let name = item.metadata.name.clone().unwrap_or_default();
        let spec_value = item.data.get("spec").cloned().unwrap_or_default();
        let raw: RawSloSpec =
            serde_json::from_value(spec_value).map_err(|source| Error::MalformedSlo {
                name: name.clone(),
                source,
            })?;

        let Ok(workload) = WorkloadId::new(raw.target_deployment) else {
            continue;
        };
        by_workload.insert(
            workload,
            SloRecord {
                slo_latency_ms: raw.slo_latency_ms,
                min_replicas: raw.min_replicas,
                max_replicas: raw.max_replicas,
            },
        );
    }

    Ok(by_workload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_spec_applies_documented_defaults() {
        let raw: RawSloSpec =
            serde_json::from_value(serde_json::json!({ "targetDeployment": "svc-cpu" })).unwrap();
        assert_eq!(raw.slo_latency_ms, 30.0);
        assert_eq!(raw.min_replicas, 1);
        assert_eq!(raw.max_replicas, 10);
    }

    #[test]
    fn raw_spec_honors_overrides() {
        let raw: RawSloSpec = serde_json::from_value(serde_json::json!({
            "targetDeployment": "svc-cpu",
            "sloLatency": 50.0,
            "minReplicas": 2,
            "maxReplicas": 6,
        }))
        .unwrap();
        assert_eq!(raw.slo_latency_ms, 50.0);
        assert_eq!(raw.min_replicas, 2);
        assert_eq!(raw.max_replicas, 6);
    }
}
