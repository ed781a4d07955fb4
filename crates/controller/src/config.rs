// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration.

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_AGGREGATOR_URL: &str = "http://aggregator:8000";
const DEFAULT_SLO_GROUP: &str = "autoscaling.tracescale.io";
const DEFAULT_SLO_VERSION: &str = "v1alpha1";

/// The controller's configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// The namespace `ServiceSLO` objects and scale targets live in.
    pub target_namespace: String,
    /// Base URL of the aggregator's `/api/graph` endpoint.
    pub aggregator_url: String,
    /// API group the `ServiceSLO` custom resource is registered under.
    pub slo_group: String,
    /// API version the `ServiceSLO` custom resource is registered under.
    pub slo_version: String,
}

impl ControllerConfig {
    /// Reads configuration from the process environment, applying the
    /// documented defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            target_namespace: std::env::var("TARGET_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            aggregator_url: std::env::var("AGGREGATOR_URL")
                .unwrap_or_else(|_| DEFAULT_AGGREGATOR_URL.to_string()),
            slo_group: std::env::var("SLO_GROUP").unwrap_or_else(|_| DEFAULT_SLO_GROUP.to_string()),
            slo_version: std::env::var("SLO_VERSION")
                .unwrap_or_else(|_| DEFAULT_SLO_VERSION.to_string()),
        }
    }

    /// The fully-qualified aggregator graph endpoint to scrape each tick.
    #[must_use]
    pub fn graph_url(&self) -> String {
        format!("{}/api/graph", self.aggregator_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_defaults_are_stable() {
        assert_eq!(DEFAULT_NAMESPACE, "default");
        assert_eq!(DEFAULT_AGGREGATOR_URL, "http://aggregator:8000");
        assert_eq!(DEFAULT_SLO_GROUP, "autoscaling.tracescale.io");
        assert_eq!(DEFAULT_SLO_VERSION, "v1alpha1");
    }

    #[test]
    fn graph_url_joins_base_and_trims_trailing_slash() {
        let mut config = ControllerConfig::from_env();
        config.aggregator_url = "http://aggregator:8000/".to_string();
        assert_eq!(config.graph_url(), "http://aggregator:8000/api/graph");
    }
}
