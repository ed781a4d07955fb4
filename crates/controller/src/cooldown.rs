// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-target cooldown tracking and the health/violating/scaling/cooling
//! state machine, kept separate from the decision algorithm itself because
//! both are a function of wall-clock time, not of a single tick's fused
//! view.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracescale_common::WorkloadId;

/// Minimum interval between two scale actions for the same target.
pub const COOLDOWN: Duration = Duration::from_secs(15);

/// `workload → last_scale_timestamp`.
#[derive(Debug, Default)]
pub struct CooldownMap {
    last_scale: HashMap<WorkloadId, Instant>,
}

impl CooldownMap {
    /// Creates an empty cooldown map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `target` is still within its cooldown window as of `now`.
    #[must_use]
    pub fn in_cooldown(&self, target: &WorkloadId, now: Instant) -> bool {
        self.last_scale
            .get(target)
            .is_some_and(|last| now.saturating_duration_since(*last) < COOLDOWN)
    }

    /// Records a successful scale action for `target` at `now`.
    pub fn record_scale(&mut self, target: WorkloadId, now: Instant) {
        let _ = self.last_scale.insert(target, now);
    }
}

/// A target's position in the scaling state machine. Purely observational —
/// every transition is already implied by the decision algorithm's own
/// inputs (violating/in_cooldown/scaled); this type just names the states
/// for logging so an operator can read a target's history from the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPhase {
    /// Latency is within SLO (or the workload isn't observed this tick).
    Healthy,
    /// Latency exceeds SLO but no scale action was taken this tick.
    Violating,
    /// A scale patch was issued to this target this tick.
    Scaling,
    /// A scale patch was issued previously and the cooldown has not elapsed.
    Cooling,
}

/// Tracks the current [`TargetPhase`] of every target the controller has
/// ever evaluated. Defaults unseen targets to [`TargetPhase::Healthy`], the
/// state machine's implicit starting point.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: HashMap<WorkloadId, TargetPhase>,
}

impl PhaseTracker {
    /// Creates a tracker with no recorded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last recorded phase for `target`, or `Healthy` if never observed.
    #[must_use]
    pub fn phase(&self, target: &WorkloadId) -> TargetPhase {
        self.phases.get(target).copied().unwrap_or(TargetPhase::Healthy)
    }

    /// Advances `target`'s phase given this tick's outcome and returns it.
    ///
    /// `violating`: the target (or a workload attributed to it) exceeded its
    /// SLO this tick. `in_cooldown`: the target was within its cooldown
    /// window when evaluated. `scaled`: a scale patch was issued to the
    /// target this tick. These three together fully determine the next
    /// phase.
    pub fn observe(&mut self, target: &WorkloadId, violating: bool, in_cooldown: bool, scaled: bool) -> TargetPhase {
        let next = if !violating {
            TargetPhase::Healthy
        } else if scaled {
            TargetPhase::Scaling
        } else if in_cooldown {
            TargetPhase::Cooling
        } else {
            TargetPhase::Violating
        };

        if next != self.phase(target) {
            tracing::info!(%target, ?next, "target phase transition");
        }
        let _ = self.phases.insert(target.clone(), next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(s: &str) -> WorkloadId {
        WorkloadId::new(s).unwrap()
    }

    #[test]
    fn cooldown_blocks_until_the_window_elapses() {
        let mut map = CooldownMap::new();
        let target = workload("svc-a");
        let t0 = Instant::now();
        map.record_scale(target.clone(), t0);

        assert!(map.in_cooldown(&target, t0 + Duration::from_secs(5)));
        assert!(!map.in_cooldown(&target, t0 + Duration::from_secs(20)));
    }

    #[test]
    fn unscaled_target_is_never_in_cooldown() {
        let map = CooldownMap::new();
        assert!(!map.in_cooldown(&workload("svc-a"), Instant::now()));
    }

    #[test]
    fn unseen_target_starts_healthy() {
        let tracker = PhaseTracker::new();
        assert_eq!(tracker.phase(&workload("svc-a")), TargetPhase::Healthy);
    }

    #[test]
    fn full_state_machine_walk() {
        let mut tracker = PhaseTracker::new();
        let a = workload("svc-a");

        // healthy -> violating
        assert_eq!(tracker.observe(&a, true, false, false), TargetPhase::Violating);
        // violating -> scaling
        assert_eq!(tracker.observe(&a, true, false, true), TargetPhase::Scaling);
        // scaling -> cooling (still violating, now within cooldown, no new scale)
        assert_eq!(tracker.observe(&a, true, true, false), TargetPhase::Cooling);
        // cooling -> healthy once the next observation is healthy
        assert_eq!(tracker.observe(&a, false, false, false), TargetPhase::Healthy);
    }
}
