// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Discovers node agent pods to scrape this tick.

/// Port the node agent's scrape server binds to.
const AGENT_SCRAPE_PORT: u16 = 5000;

/// Lists every running node agent pod in `namespace` matching `label_selector`
/// and returns the scrape URL for each one that has been assigned an IP.
/// Pods without an IP yet (pending, not yet scheduled) are silently skipped:
/// they haven't reported anything for this tick to pick up anyway.
pub async fn discover_scrape_targets(
    client: &kube::Client,
    namespace: &str,
    label_selector: &str,
) -> Result<Vec<String>, tracescale_k8s::Error> {
    let pods = tracescale_k8s::pods::list_pods(client, namespace, Some(label_selector)).await?;
    Ok(pods
        .into_iter()
        .filter_map(|pod| pod.ip)
        .map(|ip| format!("http://{ip}:{AGENT_SCRAPE_PORT}/"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_port_matches_the_documented_agent_port() {
        assert_eq!(AGENT_SCRAPE_PORT, 5000);
    }
}
