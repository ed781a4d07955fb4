// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The tracer-reader task: the tight read loop over the tracer's stdout
//! that parses events, resolves identity, and mutates the shared
//! aggregation state.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;

use crate::aggregate::AgentState;
use crate::error::Error;
use crate::parser::{self, TracerEvent};
use crate::resolution::{PidCache, ResolutionTables};

/// Consumes `child`'s stdout until it closes or the process exits, applying
/// every resolvable event to `state`. Returns once the tracer is gone: a
/// dead tracer is a fatal condition for the agent; its supervisor is
/// expected to restart the whole process.
pub async fn run(
    mut child: Child,
    self_pid: u32,
    tables: Arc<ArcSwap<ResolutionTables>>,
    state: Arc<AgentState>,
) -> Result<(), Error> {
    let tracer_pid = child.id();
    let stdout = child
        .stdout
        .take()
        .expect("tracer was spawned with a piped stdout");
    let mut lines = BufReader::new(stdout).lines();
    let mut pid_cache = PidCache::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(%err, "error reading tracer stdout, treating as eof");
                break;
            }
        };

        let Some(event) = parser::parse_line(&line) else {
            continue;
        };
        if is_self_event(&event, self_pid, tracer_pid) {
            continue;
        }

        apply(event, &mut pid_cache, &tables.load(), &state);
    }

    let status = child.wait().await.map_err(Error::TracerWait)?;
    Err(Error::TracerExited { status })
}

fn event_pid(event: &TracerEvent) -> u32 {
    match event {
        TracerEvent::Latency { pid, .. }
        | TracerEvent::Error { pid }
        | TracerEvent::Conn { pid, .. } => *pid,
    }
}

fn is_self_event(event: &TracerEvent, self_pid: u32, tracer_pid: Option<u32>) -> bool {
    let pid = event_pid(event);
    pid == self_pid || tracer_pid.is_some_and(|tracer_pid| pid == tracer_pid)
}

fn apply(
    event: TracerEvent,
    pid_cache: &mut PidCache,
    tables: &ResolutionTables,
    state: &AgentState,
) {
    match event {
        TracerEvent::Latency { pid, duration_us } => {
            if let Some(workload) = pid_cache.resolve(pid, tables) {
                state.record_latency(&workload, duration_us);
            }
        }
        TracerEvent::Error { pid } => {
            if let Some(workload) = pid_cache.resolve(pid, tables) {
                state.record_error(&workload);
            }
        }
        TracerEvent::Conn { pid, dest_ip } => {
            if parser::is_local_address(&dest_ip) {
                return;
            }
            let Some(source) = pid_cache.resolve(pid, tables) else {
                return;
            };
            match tables.resolve_ip(&dest_ip) {
                Some(dest) => state.record_edge(&source, dest),
                None => tracing::debug!(%source, dest_ip, "connection to unmapped destination"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_pid_and_tracer_pid_events_are_excluded() {
        let event = TracerEvent::Latency {
            pid: 42,
            duration_us: 1,
        };
        assert!(is_self_event(&event, 42, Some(7)));
        assert!(is_self_event(
            &TracerEvent::Error { pid: 7 },
            42,
            Some(7)
        ));
        assert!(!is_self_event(
            &TracerEvent::Error { pid: 9 },
            42,
            Some(7)
        ));
    }
}
