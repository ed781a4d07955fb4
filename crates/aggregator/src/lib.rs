// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The fleet aggregator.
//!
//! Two concurrent tasks share one piece of state, the [`store::Store`]: the
//! merge scheduler is the state's single writer (it discovers and scrapes
//! node agents every tick, fuses the results, and installs a fresh
//! snapshot), and the HTTP server reads the published snapshot lock-free.
//! `GET /api/reset` is the one operation that reaches across that boundary,
//! via the store's own reset flag rather than any shared mutex.

pub mod config;
mod discovery;
pub mod error;
mod http;
pub mod merge;
pub mod scrape;
mod shutdown;
pub mod store;
mod tick;

use tokio_util::sync::CancellationToken;

pub use config::AggregatorConfig;
pub use error::Error;
use store::Store;

/// Runs the aggregator until the HTTP server fails to bind or serve, or a
/// termination signal arrives and shuts it down gracefully. The merge
/// scheduler itself runs forever and has no normal termination path; its
/// supervisor is expected to restart the whole process on any fatal
/// condition here.
pub async fn run(config: AggregatorConfig) -> Result<(), Error> {
    let client = tracescale_k8s::connect().await?;
    let http_client = scrape::build_client().map_err(Error::ScrapeClientSetup)?;
    let store = Store::new();
    let cancel = CancellationToken::new();

    let merge_task = tokio::spawn(tick::run(
        client,
        http_client,
        config.target_namespace.clone(),
        config.agent_label_selector.clone(),
        store.clone(),
    ));

    let signal_cancel = cancel.clone();
    let signal_task = tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        tracing::info!("shutdown signal received, stopping aggregator");
        signal_cancel.cancel();
    });

    let result = http::run(&config.http_bind_addr, store, cancel).await;
    merge_task.abort();
    signal_task.abort();
    result
}
