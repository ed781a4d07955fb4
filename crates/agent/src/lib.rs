// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The per-node tracing agent.
//!
//! Three concurrent tasks share two pieces of state: the resolution tables
//! (single writer, atomically swapped, many lock-free readers) and the
//! metric/edge accumulators (single writer, read-and-reset under one
//! mutex). The metadata refresher owns the former; the tracer reader writes
//! the latter and reads the former; the scrape server reads-and-resets the
//! latter. None of the three ever blocks on either of the others.

mod aggregate;
pub mod config;
pub mod error;
mod http;
mod parser;
mod reader;
mod resolution;
mod shutdown;
mod tracer;

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;

pub use config::AgentConfig;
pub use error::Error;

/// Runs the node agent until the tracer exits, the scrape server fails to
/// bind, or a termination signal arrives. The first two are fatal for this
/// process and its supervisor is expected to restart it; the third is a
/// clean shutdown.
pub async fn run(config: AgentConfig) -> Result<(), Error> {
    let client = tracescale_k8s::connect().await?;
    let tables = Arc::new(ArcSwap::from_pointee(resolution::ResolutionTables::default()));
    let state = Arc::new(aggregate::AgentState::new());
    let cancel = CancellationToken::new();

    let refresh_task = tokio::spawn(resolution::refresh_loop(
        client,
        config.target_namespace.clone(),
        config.my_pod_name.clone(),
        Arc::clone(&tables),
    ));

    let mut child = tracer::spawn(&config.tracer_path).await?;
    let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(tracer::log_stderr(stderr)));

    let self_pid = std::process::id();
    let reader_task = reader::run(child, self_pid, Arc::clone(&tables), Arc::clone(&state));

    let server_cancel = cancel.clone();
    tokio::select! {
        result = reader_task => {
            cancel.cancel();
            refresh_task.abort();
            if let Some(task) = &stderr_task {
                task.abort();
            }
            result
        }
        result = http::run(&config.scrape_bind_addr, state, server_cancel) => {
            cancel.cancel();
            refresh_task.abort();
            if let Some(task) = &stderr_task {
                task.abort();
            }
            result
        }
        () = shutdown::wait_for_signal() => {
            tracing::info!("shutdown signal received, stopping node agent");
            cancel.cancel();
            refresh_task.abort();
            if let Some(task) = &stderr_task {
                task.abort();
            }
            Ok(())
        }
    }
}
