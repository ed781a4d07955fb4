// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Concurrently scrapes every discovered node agent with a bounded timeout.
//!
//! A failed scrape (timeout, connection refused, non-200, unparseable body)
//! is a [`TransientPeerFailure`](crate::error::Error) in spirit: it is logged
//! at warning and the target's contribution is simply absent from this
//! tick's merge. It never aborts the tick.

use std::time::Duration;

use futures::future::join_all;
use tracescale_common::scrape::ScrapeDocument;

/// Upper bound on a single node agent scrape.
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the `reqwest::Client` used to scrape node agents, with the
/// documented per-call timeout baked in so every caller gets it for free.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(SCRAPE_TIMEOUT).build()
}

/// Scrapes every target concurrently, returning only the documents that
/// succeeded. Order does not correspond to `targets`.
pub async fn scrape_all(client: &reqwest::Client, targets: &[String]) -> Vec<ScrapeDocument> {
    join_all(targets.iter().map(|target| scrape_one(client, target)))
        .await
        .into_iter()
        .flatten()
        .collect()
}

async fn scrape_one(client: &reqwest::Client, target: &str) -> Option<ScrapeDocument> {
    let response = match client.get(target).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(target, %err, "node agent scrape failed, skipping for this tick");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(target, status = %response.status(), "node agent returned a non-200 scrape response");
        return None;
    }

    match response.json::<ScrapeDocument>().await {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!(target, %err, "node agent scrape response was malformed");
            None
        }
    }
}
