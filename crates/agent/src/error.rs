// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the node agent.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while running the node agent.
///
/// Every variant here is a [`FatalStartup`](Error) in spirit: none of them
/// are constructed for conditions the agent is expected to recover from on
/// its own (those are logged and swallowed where they occur, per the
/// tracer-reader and metadata-refresher loops).
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The configured bind address is invalid and could not be parsed.
    #[error("invalid bind address '{bind_address}': {source}")]
    InvalidBindAddress {
        /// The bind address that failed to parse.
        bind_address: String,
        /// The underlying parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind the TCP listener on the given address.
    #[error("failed to bind scrape server on '{addr}': {source}")]
    BindFailed {
        /// The address we attempted to bind to.
        addr: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server encountered a fatal error while serving.
    #[error("scrape server error on '{addr}': {source}")]
    ServerError {
        /// The address the server was bound to.
        addr: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The tracer binary could not be spawned.
    #[error("failed to spawn tracer '{path}': {source}")]
    TracerSpawn {
        /// The path the agent tried to execute.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The tracer process exited; the agent does not restart it (its
    /// supervisor does).
    #[error("tracer exited with status {status}")]
    TracerExited {
        /// The tracer's exit status.
        status: std::process::ExitStatus,
    },

    /// Writing the generated tracer script to disk failed.
    #[error("failed to write tracer script to '{path}': {source}")]
    TracerScriptWrite {
        /// The path the agent tried to write.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the tracer's exit status failed.
    #[error("failed to wait on tracer process: {0}")]
    TracerWait(#[source] std::io::Error),

    /// The orchestrator client could not be constructed at startup.
    #[error("orchestrator client setup failed: {0}")]
    Orchestrator(#[from] tracescale_k8s::Error),
}
