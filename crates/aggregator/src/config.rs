// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration.

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_AGENT_LABEL_SELECTOR: &str = "app=bpf-agent";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// The aggregator's configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// The namespace node agent pods are discovered in.
    pub target_namespace: String,
    /// The label selector used to discover node agent pods.
    pub agent_label_selector: String,
    /// Address the `/api/graph`, `/api/reset`, and `/health` HTTP server binds to.
    pub http_bind_addr: String,
}

impl AggregatorConfig {
    /// Reads configuration from the process environment, applying the
    /// documented defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            target_namespace: std::env::var("TARGET_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            agent_label_selector: std::env::var("AGENT_LABEL_SELECTOR")
                .unwrap_or_else(|_| DEFAULT_AGENT_LABEL_SELECTOR.to_string()),
            http_bind_addr: std::env::var("HTTP_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}
