// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Integration test: scrape two fake node agents over real HTTP and fuse
//! their responses, exercising the scrape client and the merge step
//! together against a live (wiremocked) peer rather than in-process data.

use serde_json::json;
use tracescale_aggregator::{merge, scrape};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn scrapes_and_merges_two_agents() {
    let agent_a = MockServer::start().await;
    let agent_b = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metrics": {"svc-cpu": {"latency": 10.0, "rps": 30.0, "error_rate": 1.0, "count": 30}},
            "topology": {"svc-cpu": ["svc-db"]}
        })))
        .mount(&agent_a)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metrics": {"svc-cpu": {"latency": 20.0, "rps": 10.0, "error_rate": 0.0, "count": 10}},
            "topology": {"svc-cpu": ["svc-cache"]}
        })))
        .mount(&agent_b)
        .await;

    let client = scrape::build_client().expect("client builds");
    let targets = vec![agent_a.uri(), agent_b.uri()];
    let documents = scrape::scrape_all(&client, &targets).await;
    assert_eq!(documents.len(), 2);

    let (metrics, topology) = merge::merge_tick(&documents);
    let cpu = tracescale_common::WorkloadId::new("svc-cpu").unwrap();
    let merged = metrics.get(&cpu).expect("svc-cpu reported by both agents");

    // (10*30 + 20*10) / 40 = 12.5
    assert_eq!(merged.latency_ms, 12.5);
    assert_eq!(merged.rps, 40.0);
    assert_eq!(merged.error_rate, 1.0);
    assert_eq!(merged.count, 40);

    let dests = topology.get(&cpu).expect("svc-cpu has downstream edges");
    assert_eq!(dests.len(), 2);
}

#[tokio::test]
async fn unreachable_target_is_skipped_not_fatal() {
    let agent = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metrics": {"svc-cpu": {"latency": 5.0, "rps": 50.0, "error_rate": 0.0, "count": 100}},
            "topology": {}
        })))
        .mount(&agent)
        .await;

    let client = scrape::build_client().expect("client builds");
    // Port 1 is reserved and never accepts connections; this simulates an
    // agent pod that has gone away mid-tick.
    let targets = vec![agent.uri(), "http://127.0.0.1:1/".to_string()];
    let documents = scrape::scrape_all(&client, &targets).await;

    assert_eq!(documents.len(), 1);
}
