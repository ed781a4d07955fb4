// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The merge scheduler: every tick, discover node agents, scrape them
//! concurrently, fuse the results, and publish a fresh snapshot.

use std::time::Duration;

use crate::store::{MergeState, Store};
use crate::{discovery, merge, scrape};

/// Cadence at which the aggregator discovers and scrapes node agents.
pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Runs the merge scheduler forever. Discovery or scrape failures are
/// logged and simply reduce this tick's fidelity; they never stop the loop.
pub async fn run(
    client: kube::Client,
    http_client: reqwest::Client,
    namespace: String,
    agent_label_selector: String,
    store: Store,
) {
    let mut state = MergeState::new();
    let mut interval = tokio::time::interval(TICK_INTERVAL);

    loop {
        let _ = interval.tick().await;

        if store.take_reset_request() {
            state.clear();
            tracing::info!("fused view reset; merge state cleared");
        }

        let targets =
            match discovery::discover_scrape_targets(&client, &namespace, &agent_label_selector)
                .await
            {
                Ok(targets) => targets,
                Err(err) => {
                    tracing::warn!(%err, "failed to discover node agent pods this tick");
                    continue;
                }
            };

        let documents = scrape::scrape_all(&http_client, &targets).await;
        tracing::debug!(
            discovered = targets.len(),
            scraped = documents.len(),
            "merge tick"
        );

        let (metrics, topology) = merge::merge_tick(&documents);
        let snapshot = state.apply_tick(metrics, topology);
        store.publish(snapshot);
    }
}
