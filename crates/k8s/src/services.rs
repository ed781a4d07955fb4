// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Service inventory, used to resolve a `ClusterIP` seen on a `CONN` line
//! back to the workload it fronts.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, ListParams};

use crate::error::Error;

/// The subset of a service's state needed for ip → workload resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The service's name.
    pub name: String,
    /// The service's `ClusterIP`, if one is assigned (headless services have
    /// none and are skipped by resolution).
    pub cluster_ip: Option<String>,
    /// The service's labels.
    pub labels: BTreeMap<String, String>,
}

/// Lists services in `namespace`.
pub async fn list_services(
    client: &kube::Client,
    namespace: &str,
) -> Result<Vec<ServiceInfo>, Error> {
    let api: Api<Service> = Api::namespaced(client.clone(), namespace);
    let list = api
        .list(&ListParams::default())
        .await
        .map_err(|source| Error::List {
            resource: "services",
            namespace: namespace.to_string(),
            source,
        })?;

    Ok(list
        .items
        .into_iter()
        .map(|svc| {
            let name = svc.metadata.name.unwrap_or_default();
            let labels = svc
                .metadata
                .labels
                .unwrap_or_default()
                .into_iter()
                .collect();
            let cluster_ip = svc
                .spec
                .and_then(|spec| spec.cluster_ip)
                .filter(|ip| ip != "None");
            ServiceInfo {
                name,
                cluster_ip,
                labels,
            }
        })
        .collect())
}
