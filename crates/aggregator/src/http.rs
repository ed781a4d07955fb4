// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The aggregator's HTTP surface: `GET /api/graph`, `GET /api/reset`,
//! `GET /health`. CORS is permissive, since the fused view is read by
//! browser-based dashboards outside this system's scope.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracescale_common::scrape::ScrapeDocument;

use crate::error::Error;
use crate::store::Store;

async fn graph(State(store): State<Store>) -> Json<ScrapeDocument> {
    Json((*store.current()).clone())
}

async fn reset(State(store): State<Store>) -> StatusCode {
    store.reset();
    StatusCode::OK
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Serves the aggregator's HTTP endpoints on `bind_addr` until `cancel` fires.
pub async fn run(bind_addr: &str, store: Store, cancel: CancellationToken) -> Result<(), Error> {
    let addr = bind_addr
        .parse::<SocketAddr>()
        .map_err(|source| Error::InvalidBindAddress {
            bind_address: bind_addr.to_string(),
            source,
        })?;

    let app = Router::new()
        .route("/api/graph", get(graph))
        .route("/api/reset", get(reset))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(store);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::BindFailed {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!(%addr, "aggregator HTTP server listening");

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
