// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Reads and patches a deployment's `scale` subresource: the only mutation
//! the controller ever makes against the cluster.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::Scale;
use kube::api::{Api, Patch, PatchParams};

use crate::error::Error;

const FIELD_MANAGER: &str = "tracescale-controller";

/// Reads the desired replica count of `name` in `namespace`, i.e.
/// `spec.replicas` rather than `status.replicas`: during a rollout or within
/// a cooldown window the observed (status) count can lag the desired (spec)
/// one, and the deterministic replica calculation must start from the
/// desired count to stay consistent with what the last patch actually
/// requested.
pub async fn read_replicas(
    client: &kube::Client,
    namespace: &str,
    name: &str,
) -> Result<i32, Error> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let scale = api
        .get_scale(name)
        .await
        .map_err(|source| Error::GetScale {
            name: name.to_string(),
            namespace: namespace.to_string(),
            source,
        })?;

    Ok(scale.spec.and_then(|spec| spec.replicas).unwrap_or(1))
}

/// Patches `name` in `namespace` to `replicas`, the only mutating call the
/// controller ever makes against the orchestrator.
pub async fn patch_replicas(
    client: &kube::Client,
    namespace: &str,
    name: &str,
    replicas: i32,
) -> Result<(), Error> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let patch: Patch<Scale> = Patch::Merge(serde_json::json!({
        "spec": { "replicas": replicas }
    }));
    let params = PatchParams::apply(FIELD_MANAGER);

    let _ = api
        .patch_scale(name, &params, &patch)
        .await
        .map_err(|source| Error::PatchScale {
            name: name.to_string(),
            namespace: namespace.to_string(),
            replicas,
            source,
        })?;

    Ok(())
}
