// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Client construction for the orchestrator.

use crate::error::Error;

/// Builds a [`kube::Client`], preferring in-cluster service account
/// credentials and falling back to a local kubeconfig.
///
/// `kube::Client::try_default` already implements this fallback (it infers
/// the config source the same way `kubectl` does), so there is nothing
/// agent/aggregator/controller-specific to do here beyond giving callers one
/// place to change that behavior later.
pub async fn connect() -> Result<kube::Client, Error> {
    kube::Client::try_default().await.map_err(Error::ClientSetup)
}
