// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the orchestrator client crate.

use thiserror::Error;

/// Errors that can occur while talking to the cluster orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// Could not build a client from in-cluster config or a local kubeconfig.
    #[error("failed to build an orchestrator client: {0}")]
    ClientSetup(#[source] kube::Error),

    /// A pod, service, or custom object list call failed.
    #[error("failed to list {resource} in namespace '{namespace}': {source}")]
    List {
        /// The kind of resource being listed (`pods`, `services`, `serviceslos`, ...).
        resource: &'static str,
        /// The namespace the list call was scoped to.
        namespace: String,
        /// The underlying client error.
        #[source]
        source: kube::Error,
    },

    /// A `ServiceSLO` object was present but its `spec` did not match the
    /// expected shape.
    #[error("malformed ServiceSLO object '{name}': {source}")]
    MalformedSlo {
        /// The name of the offending object.
        name: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading a deployment's scale subresource failed.
    #[error("failed to read scale for deployment '{name}' in namespace '{namespace}': {source}")]
    GetScale {
        /// The deployment name.
        name: String,
        /// The namespace the deployment lives in.
        namespace: String,
        /// The underlying client error.
        #[source]
        source: kube::Error,
    },

    /// Patching a deployment's scale subresource failed.
    #[error(
        "failed to patch scale for deployment '{name}' in namespace '{namespace}' to {replicas} replicas: {source}"
    )]
    PatchScale {
        /// The deployment name.
        name: String,
        /// The namespace the deployment lives in.
        namespace: String,
        /// The replica count that was requested.
        replicas: i32,
        /// The underlying client error.
        #[source]
        source: kube::Error,
    },
}
