// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Spawns the kernel tracer and reads its line-delimited event stream.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

use crate::error::Error;

/// The bpftrace program this agent runs. Request start is the first
/// unmatched `read`/`recvfrom` on a thread (subsequent reads during the same
/// request must not reset the timer); request end is the next
/// `write`/`sendto` on that thread. Error syscalls and outbound `connect()`
/// calls (IPv4 and IPv6) are reported independently of the latency timer.
const BPF_PROGRAM: &str = r#"
#include <linux/in.h>
#include <linux/in6.h>

tracepoint:syscalls:sys_exit_read, tracepoint:syscalls:sys_exit_recvfrom {
    if (@start[tid] == 0) {
        @start[tid] = nsecs;
    }
}

tracepoint:syscalls:sys_enter_write, tracepoint:syscalls:sys_enter_sendto {
    if (@start[tid] != 0) {
        $delta_us = (nsecs - @start[tid]) / 1000;
        if ($delta_us > 0) {
            printf("LAT %d %d\n", pid, $delta_us);
        }
        delete(@start[tid]);
    }
}

tracepoint:syscalls:sys_exit_write, tracepoint:syscalls:sys_exit_sendto,
tracepoint:syscalls:sys_exit_read, tracepoint:syscalls:sys_exit_recvfrom {
    if (args->ret < 0) {
        printf("ERR %d %ld\n", pid, args->ret);
    }
}

tracepoint:syscalls:sys_enter_connect {
    $addr = (struct sockaddr *)args->uservaddr;
    if ($addr->sa_family == 2) {
        $addr4 = (struct sockaddr_in *)args->uservaddr;
        printf("CONN %d %s\n", pid, ntop($addr4->sin_addr.s_addr));
    }
    if ($addr->sa_family == 10) {
        $addr6 = (struct sockaddr_in6 *)args->uservaddr;
        printf("CONN %d %s\n", pid, ntop($addr6->sin6_addr.in6_u.u6_addr8));
    }
}
"#;

fn script_path() -> PathBuf {
    std::env::temp_dir().join("tracescale-sensor.bt")
}

/// Writes the tracer program to disk and spawns it, piping stdout/stderr.
pub async fn spawn(tracer_path: &Path) -> Result<Child, Error> {
    let script = script_path();
    tokio::fs::write(&script, BPF_PROGRAM)
        .await
        .map_err(|source| Error::TracerScriptWrite {
            path: script.clone(),
            source,
        })?;

    Command::new(tracer_path)
        .arg(&script)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Error::TracerSpawn {
            path: tracer_path.to_path_buf(),
            source,
        })
}

/// Drains a tracer's stderr pipe to the log at warning level until it closes.
pub async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::warn!(tracer_stderr = %line, "tracer reported an error");
    }
}
