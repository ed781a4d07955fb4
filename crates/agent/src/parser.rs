// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Parses the tracer's line-delimited event grammar (`LAT`, `ERR`, `CONN`).
//!
//! Malformed lines are dropped silently and never surface as errors: an
//! unparseable tracer line is `MalformedInput`, which does not advance any
//! counter and does not propagate.

/// One parsed tracer event.
#[derive(Debug, Clone, PartialEq)]
pub enum TracerEvent {
    /// `LAT <pid> <duration_us>`: a completed request.
    Latency {
        /// The originating process id.
        pid: u32,
        /// The request's duration in microseconds.
        duration_us: u64,
    },
    /// `ERR <pid> <negative_return_code>`: a syscall returning an error.
    Error {
        /// The originating process id.
        pid: u32,
    },
    /// `CONN <pid> <ip>`: an outbound connect() attempt.
    Conn {
        /// The originating process id.
        pid: u32,
        /// The destination address, as emitted by the tracer.
        dest_ip: String,
    },
}

/// Parses one line of tracer output, returning `None` for anything that
/// doesn't match the grammar (unrecognized kind, too few fields, an
/// unparseable pid or duration).
#[must_use]
pub fn parse_line(line: &str) -> Option<TracerEvent> {
    let mut parts = line.split_whitespace();
    let kind = parts.next()?;
    let pid: u32 = parts.next()?.parse().ok()?;

    match kind {
        "LAT" => {
            let duration_us: u64 = parts.next()?.parse().ok()?;
            Some(TracerEvent::Latency { pid, duration_us })
        }
        "ERR" => Some(TracerEvent::Error { pid }),
        "CONN" => {
            let dest_ip = normalize_ip(parts.next()?);
            Some(TracerEvent::Conn { pid, dest_ip })
        }
        _ => None,
    }
}

/// Strips the `::ffff:` v4-in-v6 mapping prefix bpftrace's `ntop()` can emit
/// for IPv4 connections seen through a dual-stack socket.
fn normalize_ip(raw: &str) -> String {
    raw.strip_prefix("::ffff:").unwrap_or(raw).to_string()
}

/// Whether `ip` is loopback or link-local and should never be recorded as a
/// topology edge target.
#[must_use]
pub fn is_local_address(ip: &str) -> bool {
    ip.starts_with("127.") || ip.starts_with("0.0.") || ip == "::1" || ip.starts_with("fe80:")
}
