// SPDX-License-Identifier: MIT
//! Session orchestrator — the state machine tying the MCP session, the
//! controller, the event log, and the report synthesizer together.
//!
//! Whatever path a run takes — normal completion, dispatch failure, startup
//! failure — teardown always performs, in order: artifact collection, report
//! synthesis, release of the tool-process session.  The ordering guarantees
//! the report reflects the final artifact set and that the process is torn
//! down only after its output files have been read.

use std::io::{BufRead, Write as _};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::controller::Controller;
use crate::error::PilotError;
use crate::mcp::ToolBackend;
use crate::report;
use crate::session::{collect_artifacts, truncate_result, Session, SessionStatus};

/// Wall-clock bound per interactive request.
pub const INTERACTIVE_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Wall-clock bound for the single scripted request.
pub const SCRIPTED_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Where the orchestrator currently is.  `Terminated` is the single terminal
/// state, reached from any other on fatal error, user exit, or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    ServerStarting,
    ServerReady,
    Dispatching,
    AwaitingResult,
    Terminating,
    Terminated,
}

enum DispatchOutcome {
    Completed(String),
    TimedOut,
    Failed,
}

pub struct SessionOrchestrator<B, C> {
    session: Session,
    backend: B,
    controller: C,
    request_timeout: Duration,
    state: OrchestratorState,
    reports: Vec<PathBuf>,
    report_seq: u32,
}

impl<B: ToolBackend, C: Controller> SessionOrchestrator<B, C> {
    pub fn new(session: Session, backend: B, controller: C, request_timeout: Duration) -> Self {
        Self {
            session,
            backend,
            controller,
            request_timeout,
            state: OrchestratorState::Idle,
            reports: Vec::new(),
            report_seq: 1,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Every report written during this run, in render order.
    pub fn reports(&self) -> &[PathBuf] {
        &self.reports
    }

    /// Interactive mode: accept free-text requests from `input` until `exit`.
    /// The reserved token `report` renders a report on demand without leaving
    /// the request loop.  Dispatch failures are logged and the loop continues.
    ///
    /// Only a startup failure propagates, and only after teardown (including
    /// the final report) has completed.
    pub async fn run_interactive<R: BufRead>(&mut self, input: R) -> Result<(), PilotError> {
        let startup = self.start_server().await;
        if startup.is_ok() {
            self.session
                .log_result("AI agent created", "Controller bound to MCP session");
            println!(
                "Session {} started. Type a request, 'report' for an on-demand report, or 'exit' to quit.",
                self.session.id
            );

            let mut lines = input.lines();
            loop {
                print!("\nYour request -> ");
                let _ = std::io::stdout().flush();
                let Some(Ok(line)) = lines.next() else { break };
                let request = line.trim();
                if request.is_empty() {
                    continue;
                }
                if request.eq_ignore_ascii_case("exit") {
                    break;
                }
                if request.eq_ignore_ascii_case("report") {
                    self.session.log("Report requested");
                    collect_artifacts(&mut self.session);
                    match self.render() {
                        Ok(path) => println!("Report generated: {}", path.display()),
                        Err(e) => warn!(error = %e, "on-demand report failed"),
                    }
                    continue;
                }
                let _ = self.dispatch_one(request).await;
            }
            self.session.status = SessionStatus::CompletedOk;
        } else {
            self.session.status = SessionStatus::CompletedError;
        }

        self.terminate().await;
        startup
    }

    /// Scripted mode: dispatch one pre-built request, then tear down.
    ///
    /// Returns the controller's final output, or `None` when the request
    /// failed or timed out (logged, not propagated — there is nothing left
    /// to do in a single-shot run).  Only a startup failure propagates.
    pub async fn run_scripted(&mut self, request: &str) -> Result<Option<String>, PilotError> {
        let startup = self.start_server().await;
        let mut output = None;
        if startup.is_ok() {
            self.session
                .log_result("AI agent created", "Controller bound to MCP session");
            match self.dispatch_one(request).await {
                DispatchOutcome::Completed(text) => {
                    output = Some(text);
                    self.session.status = SessionStatus::CompletedOk;
                }
                DispatchOutcome::TimedOut | DispatchOutcome::Failed => {
                    self.session.status = SessionStatus::CompletedError;
                }
            }
        } else {
            self.session.status = SessionStatus::CompletedError;
        }

        self.terminate().await;
        startup.map(|()| output)
    }

    async fn start_server(&mut self) -> Result<(), PilotError> {
        self.state = OrchestratorState::ServerStarting;
        match self.backend.acquire().await {
            Ok(()) => {
                self.session
                    .log_result("MCP server started", "Server initialized successfully");
                self.state = OrchestratorState::ServerReady;
                Ok(())
            }
            Err(e) => {
                self.session.log_error("MCP server start failed", e.to_string());
                Err(e)
            }
        }
    }

    /// Dispatch one request under the wall-clock bound.  All three outcomes
    /// append an event and leave the session able to accept the next request.
    async fn dispatch_one(&mut self, request: &str) -> DispatchOutcome {
        self.state = OrchestratorState::Dispatching;
        self.session.log(format!("User request: {request}"));

        self.state = OrchestratorState::AwaitingResult;
        let bound = self.request_timeout;
        let dispatched = tokio::time::timeout(
            bound,
            self.controller.dispatch(request, &self.backend),
        )
        .await;
        self.state = OrchestratorState::ServerReady;

        match dispatched {
            Ok(Ok(output)) => {
                self.session
                    .log_result("Request completed", truncate_result(&output));
                println!("\n{output}\n");
                DispatchOutcome::Completed(output)
            }
            Err(_elapsed) => {
                let secs = bound.as_secs();
                self.session.log_error(
                    "Request timed out",
                    PilotError::RequestTimeout(secs).to_string(),
                );
                println!("Request timed out after {secs} seconds. Try a simpler request.");
                DispatchOutcome::TimedOut
            }
            Ok(Err(e)) => {
                self.session.log_error("Request failed", format!("{e:#}"));
                println!("Request failed: {e:#}");
                DispatchOutcome::Failed
            }
        }
    }

    /// Teardown, in order: collect artifacts, synthesize the final report,
    /// release the tool-process session.  A report failure is a warning —
    /// release still runs.
    async fn terminate(&mut self) {
        self.state = OrchestratorState::Terminating;
        collect_artifacts(&mut self.session);
        if let Err(e) = self.render() {
            warn!(error = %e, "final report could not be written");
        }
        self.backend.release().await;
        self.state = OrchestratorState::Terminated;
    }

    fn render(&mut self) -> Result<PathBuf, PilotError> {
        let path = report::render_report(&self.session, self.report_seq)?;
        self.report_seq += 1;
        self.reports.push(path.clone());
        Ok(path)
    }
}
