// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the aggregator.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while running the aggregator.
///
/// As in the node agent, every variant here is fatal at startup; the merge
/// loop's own per-tick failures (a node agent timing out, pod listing
/// failing) are logged and recovered from in place rather than surfaced as
/// one of these.
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
    #[error("failed to bind graph server on '{addr}': {source}")]
    BindFailed {
        /// The address we attempted to bind to.
        addr: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server encountered a fatal error while serving.
    #[error("graph server error on '{addr}': {source}")]
    ServerError {
        /// The address the server was bound to.
        addr: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Could not build an HTTP client for scraping node agents.
    #[error("failed to build scrape client: {0}")]
    ScrapeClientSetup(#[source] reqwest::Error),

    /// The orchestrator client could not be constructed at startup.
    #[error("orchestrator client setup failed: {0}")]
    Orchestrator(#[from] tracescale_k8s::Error),
}
