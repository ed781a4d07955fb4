// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! A small TTL-bounded map: entries decay once they stop being refreshed.
//!
//! Used by the aggregator to back both the fused metrics map and the fused
//! topology map: each merge tick refreshes the entries it saw this tick and
//! prunes whatever has gone `ttl` without a refresh, so a
//! workload that stops reporting (scaled to zero, node removed, ...)
//! disappears from the fused view without any explicit "remove" signal.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A `HashMap<K, V>` where every entry remembers when it was last refreshed
/// and can be pruned once that exceeds a caller-supplied TTL.
#[derive(Debug, Clone)]
pub struct TtlMap<K, V> {
    entries: HashMap<K, (V, Instant)>,
}

impl<K, V> TtlMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts or overwrites `key`, marking it as seen now.
    pub fn refresh(&mut self, key: K, value: V) {
        let _ = self.entries.insert(key, (value, Instant::now()));
    }

    /// Removes every entry last refreshed more than `ttl` ago.
    pub fn prune(&mut self, ttl: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, last_seen)| now.duration_since(*last_seen) < ttl);
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A plain `HashMap` snapshot of the current values, without the
    /// last-seen timestamps — the shape needed to serialize a fused view.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<K, V>
    where
        V: Clone,
    {
        self.entries
            .iter()
            .map(|(k, (v, _))| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> Default for TtlMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn prune_removes_only_stale_entries() {
        let mut map: TtlMap<&str, u32> = TtlMap::new();
        map.refresh("a", 1);
        sleep(Duration::from_millis(20));
        map.refresh("b", 2);

        map.prune(Duration::from_millis(10));

        let snap = map.snapshot();
        assert_eq!(snap.get("a"), None);
        assert_eq!(snap.get("b"), Some(&2));
    }

    #[test]
    fn refresh_resets_the_clock() {
        let mut map: TtlMap<&str, u32> = TtlMap::new();
        map.refresh("a", 1);
        sleep(Duration::from_millis(20));
        map.refresh("a", 2);

        map.prune(Duration::from_millis(10));

        assert_eq!(map.snapshot().get("a"), Some(&2));
    }
}
