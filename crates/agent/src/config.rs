// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration.

use std::path::PathBuf;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_TRACER_PATH: &str = "bpftrace";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// The node agent's configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The namespace whose pods and services feed the resolution tables.
    pub target_namespace: String,
    /// This agent's own pod name, used to keep its own DaemonSet pod out of
    /// the resolution tables it builds for everyone else.
    pub my_pod_name: Option<String>,
    /// Path (or bare name, resolved on `PATH`) to the kernel tracer binary.
    pub tracer_path: PathBuf,
    /// Address the scrape HTTP server binds to.
    pub scrape_bind_addr: String,
}

impl AgentConfig {
    /// Reads configuration from the process environment, applying the
    /// documented defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            target_namespace: std::env::var("TARGET_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            my_pod_name: std::env::var("MY_POD_NAME").ok(),
            tracer_path: std::env::var("TRACER_PATH")
                .unwrap_or_else(|_| DEFAULT_TRACER_PATH.to_string())
                .into(),
            scrape_bind_addr: std::env::var("SCRAPE_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}
