// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The scaling controller.
//!
//! Single-threaded by design: one decision tick reads the aggregator's
//! fused view and the cluster's declared SLOs, attributes root cause, and
//! patches at most one replica count per target, before the next tick
//! begins. There is no concurrent access to guard against, so unlike the
//! node agent and the aggregator this crate needs no lock-free publishing
//! scheme at all.

pub mod config;
mod cooldown;
pub mod decision;
pub mod error;
mod shutdown;
mod tick;

use tokio_util::sync::CancellationToken;

pub use config::ControllerConfig;
pub use error::Error;

/// Runs the controller until a termination signal arrives. Only failures
/// that make every future tick impossible — the orchestrator client or the
/// aggregator HTTP client failing to construct — are returned as an error;
/// everything else (a single unreachable aggregator, a missing SLO CRD, a
/// failed patch) is logged and absorbed inside the tick loop itself.
pub async fn run(config: ControllerConfig) -> Result<(), Error> {
    let client = tracescale_k8s::connect().await?;
    let http = tick::build_client().map_err(Error::ClientSetup)?;
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    let signal_task = tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        signal_cancel.cancel();
    });

    tick::run(client, http, config, cancel).await;
    signal_task.abort();
    Ok(())
}
