// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the controller crate.

use miette::Diagnostic;

/// Errors that can occur in the controller.
///
/// Only startup failures are fatal here: an unreachable aggregator, a
/// missing SLO CRD, or a failed scale patch are all recovered from in the
/// decision loop itself (logged, tick skipped or partially applied) and
/// never construct one of these.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum Error {
    /// Could not build the HTTP client used to read the fused view.
    #[error("failed to build aggregator client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The orchestrator client could not be constructed at startup.
    #[error("orchestrator client setup failed: {0}")]
    Orchestrator(#[from] tracescale_k8s::Error),
}
