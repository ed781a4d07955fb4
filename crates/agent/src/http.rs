// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The scrape HTTP server: `GET /` returns the current metrics and
//! topology, resetting the metric accumulators as a side effect.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracescale_common::scrape::ScrapeDocument;

use crate::aggregate::AgentState;
use crate::error::Error;

#[derive(Clone)]
struct AppState {
    agent: Arc<AgentState>,
}

async fn scrape(State(state): State<AppState>) -> Json<ScrapeDocument> {
    Json(state.agent.scrape())
}

/// Serves the scrape endpoint on `bind_addr` until `cancel` fires.
pub async fn run(
    bind_addr: &str,
    agent: Arc<AgentState>,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let addr = bind_addr
        .parse::<SocketAddr>()
        .map_err(|source| Error::InvalidBindAddress {
            bind_address: bind_addr.to_string(),
            source,
        })?;

    let app = Router::new()
        .route("/", get(scrape))
        .with_state(AppState { agent });

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::BindFailed {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!(%addr, "scrape server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|source| Error::ServerError {
            addr: addr.to_string(),
            source,
        })
}
