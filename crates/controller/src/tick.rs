// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The 2-second decision loop: scrape the fused view, list declared SLOs,
//! detect violations, and patch at most one replica count per target per
//! tick.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracescale_common::scrape::ScrapeDocument;
use tracescale_common::WorkloadId;

use crate::cooldown::{CooldownMap, PhaseTracker};
use crate::config::ControllerConfig;
use crate::decision;

/// Interval between decision ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(2);
/// Upper bound on how long a single scrape of the aggregator may take.
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the HTTP client used to scrape the aggregator every tick.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(SCRAPE_TIMEOUT).build()
}

async fn fetch_graph(http: &reqwest::Client, url: &str) -> Option<ScrapeDocument> {
    match http.get(url).send().await {
        Ok(response) if response.status().is_success() => match response.json().await {
            Ok(doc) => Some(doc),
            Err(error) => {
                tracing::warn!(%url, %error, "aggregator returned a malformed graph document");
                None
            }
        },
        Ok(response) => {
            tracing::warn!(%url, status = %response.status(), "aggregator scrape returned a non-success status");
            None
        }
        Err(error) => {
            tracing::warn!(%url, %error, "failed to scrape the aggregator");
            None
        }
    }
}

/// Runs one full decision tick: fetch, detect, attribute, and act. Every
/// failure here is logged and absorbed — a single bad tick (an unreachable
/// aggregator, a transient patch failure) never stops the loop.
async fn run_tick(
    client: &kube::Client,
    http: &reqwest::Client,
    config: &ControllerConfig,
    cooldowns: &mut CooldownMap,
    phases: &mut PhaseTracker,
    now: Instant,
) {
    let Some(graph) = fetch_graph(http, &config.graph_url()).await else {
        return;
    };

    let slos = match tracescale_k8s::slo::list_service_slos(
        client,
        &config.target_namespace,
        &config.slo_group,
        &config.slo_version,
    )
    .await
    {
        Ok(slos) => slos,
        Err(error) => {
            tracing::warn!(%error, "failed to list ServiceSLO objects, skipping this tick");
            return;
        }
    };

    let violations = decision::detect_violations(&graph.metrics, &graph.topology, &slos);

    // At most one patch per target per tick: multiple sources can attribute
    // to the same target, so keep only the first, in the
    // already-deterministic `detect_violations` order.
    let mut seen = std::collections::HashSet::new();
    for violation in violations {
        if !seen.insert(violation.target.clone()) {
            continue;
        }
        act_on(client, config, cooldowns, phases, now, violation).await;
    }
}

async fn act_on(
    client: &kube::Client,
    config: &ControllerConfig,
    cooldowns: &mut CooldownMap,
    phases: &mut PhaseTracker,
    now: Instant,
    violation: decision::Violation,
) {
    let target = &violation.target;
    let in_cooldown = cooldowns.in_cooldown(target, now);

    if in_cooldown {
        phases.observe(target, true, true, false);
        return;
    }

    let current = match tracescale_k8s::scale::read_replicas(
        client,
        &config.target_namespace,
        target.as_str(),
    )
    .await
    {
        Ok(current) => current,
        Err(tracescale_k8s::Error::GetScale {
            source: kube::Error::Api(response),
            ..
        }) if response.code == 404 => {
            tracing::warn!(%target, "no deployment backs this target, skipping");
            return;
        }
        Err(error) => {
            tracing::warn!(%target, %error, "failed to read current replica count");
            return;
        }
    };

    let new_replicas =
        decision::target_replicas(current, violation.target_latency_ms, &violation.target_slo);

    // Never scale down: a lower computed target just means the workload is
    // recovering on its own.
    if new_replicas <= current {
        phases.observe(target, true, false, false);
        return;
    }

    match tracescale_k8s::scale::patch_replicas(
        client,
        &config.target_namespace,
        target.as_str(),
        new_replicas,
    )
    .await
    {
        Ok(()) => {
            tracing::info!(%target, current, new_replicas, "scaled target up");
            cooldowns.record_scale(target.clone(), now);
            phases.observe(target, true, false, true);
        }
        Err(error) => {
            tracing::warn!(%target, %error, "failed to patch replica count");
            phases.observe(target, true, false, false);
        }
    }
}

/// Runs the decision loop, once every [`TICK_INTERVAL`], until `cancel` fires.
pub async fn run(
    client: kube::Client,
    http: reqwest::Client,
    config: ControllerConfig,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    let mut cooldowns = CooldownMap::new();
    let mut phases = PhaseTracker::new();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_tick(&client, &http, &config, &mut cooldowns, &mut phases, Instant::now()).await;
            }
            () = cancel.cancelled() => {
                tracing::info!("shutdown signal received, stopping controller");
                return;
            }
        }
    }
}
