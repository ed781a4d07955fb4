// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The stable identifier used for every externally-reported key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// A workload identity: the service label of a workload (e.g. `svc-cpu`).
///
/// Kernel identifiers (pids, cgroup numbers, container UIDs) are internal to
/// the node agent and are never represented by this type; this newtype
/// exists so a kernel identifier can't be compared to a workload identity by
/// accident.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadId(String);

impl WorkloadId {
    /// Builds a workload identity from any string-like value.
    ///
    /// # Errors
    /// Returns [`Error::EmptyWorkloadId`] if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::EmptyWorkloadId);
        }
        Ok(Self(id))
    }

    /// Returns the identity as a plain string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorkloadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(matches!(WorkloadId::new(""), Err(Error::EmptyWorkloadId)));
    }

    #[test]
    fn round_trips_through_json() {
        let id = WorkloadId::new("svc-cpu").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"svc-cpu\"");
        let back: WorkloadId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
