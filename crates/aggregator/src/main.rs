// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Entrypoint for the fleet aggregator.

use tracescale_aggregator::AggregatorConfig;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .init();

    let config = AggregatorConfig::from_env();
    if let Err(err) = tracescale_aggregator::run(config).await {
        tracing::error!(%err, "aggregator exiting");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
