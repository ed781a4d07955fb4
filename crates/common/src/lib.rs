// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Shared domain model for the tracescale control plane.
//!
//! This crate has no network or process dependencies of its own: it only
//! defines the types that the node agent, the aggregator, and the controller
//! all agree on — workload identity, the per-workload metric accumulator and
//! its derived (scrape-time) form, the JSON wire schema scraped from an
//! agent and fused by the aggregator, and a small generic TTL map used to
//! expire stale entries.

mod error;
pub mod metrics;
pub mod scrape;
pub mod ttl;
mod workload;

pub use error::Error;
pub use workload::WorkloadId;
