// SPDX-License-Identifier: MIT
// Webpilot error taxonomy.
//
// Every failure mode the orchestrator distinguishes has its own variant so
// callers can branch on fatal-vs-recoverable without string-matching
// messages.  Dispatch-level failures (`RequestTimeout`, `Request`) are
// converted to session events at the orchestrator boundary and never
// propagate; only `ServerStartup` crosses it.

use std::path::PathBuf;

/// Errors produced by the webpilot session core.
#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    /// The MCP server process could not be spawned, or its handshake did not
    /// complete within the configured bound.  Fatal: the session ends, but a
    /// report covering whatever was logged is still produced.
    #[error("MCP server startup failed: {0}")]
    ServerStartup(String),

    /// A dispatched request exceeded its wall-clock bound.  Recoverable: the
    /// session logs the timeout and may accept the next request.
    #[error("request timed out after {0} seconds")]
    RequestTimeout(u64),

    /// Any other failure raised while dispatching a request.  Recoverable.
    #[error("request failed: {0}")]
    Request(String),

    /// A collected artifact vanished or became unreadable before render.
    /// Degrades to an inline note in the report; never aborts the render.
    #[error("artifact unreadable: {}: {detail}", path.display())]
    Artifact { path: PathBuf, detail: String },

    /// The report document could not be persisted.  Surfaced as a warning;
    /// never retroactively fails an otherwise-successful session.
    #[error("could not write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PilotError {
    /// True for errors that end the session outright.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PilotError::ServerStartup(_))
    }
}
