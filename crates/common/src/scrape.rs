// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The JSON wire schema shared by the node agent's scrape endpoint and the
//! aggregator's fused-view endpoint: both shapes are identical, since the
//! aggregator's `/api/graph` is just a merge of zero or more of these
//! documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metrics::DerivedMetric;
use crate::workload::WorkloadId;

/// `{source: [destinations]}`, the call-graph edge set for a scrape window.
pub type Topology = HashMap<WorkloadId, Vec<WorkloadId>>;

/// `{workload: metric}`, the per-workload metric set for a scrape window.
pub type Metrics = HashMap<WorkloadId, DerivedMetric>;

/// The document returned by `GET /` on a node agent and by `GET /api/graph`
/// on the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeDocument {
    /// Per-workload derived metrics for this scrape window.
    pub metrics: Metrics,
    /// The call-graph edge set observed so far.
    pub topology: Topology,
}
