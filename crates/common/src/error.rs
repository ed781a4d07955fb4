// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the common crate.

/// Errors that can occur while working with the shared domain model.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A workload identifier was empty.
    #[error("workload identifier must not be empty")]
    EmptyWorkloadId,
}
