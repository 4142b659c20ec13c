// SPDX-License-Identifier: MIT
//! Tool-process session — lifecycle of the Playwright MCP server subprocess.
//!
//! `ToolBackend` is the seam between the orchestrator and the external
//! process: the orchestrator drives `acquire`/`release`, the controller
//! reads `tool_defs` and issues `call_tool`.  `McpSession` is the production
//! implementation; tests substitute in-memory fakes.

pub mod client;
pub mod tools;

pub use client::McpClient;
pub use tools::McpToolDef;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::McpLaunchConfig;
use crate::error::PilotError;

/// The tool-invocation process behind one session.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Start the process and complete its handshake.  Bounded by the
    /// configured handshake timeout; any failure is `ServerStartup`.
    async fn acquire(&mut self) -> Result<(), PilotError>;

    /// The cached tool catalogue.  Empty before `acquire` completes.
    fn tool_defs(&self) -> &[McpToolDef];

    /// Invoke one tool on the running process.
    async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value>;

    /// Terminate the process and release its resources.  Idempotent, and a
    /// no-op when `acquire` never completed.
    async fn release(&mut self);
}

/// Production backend: one Playwright MCP server subprocess per session.
pub struct McpSession {
    launch: McpLaunchConfig,
    client: Option<McpClient>,
}

impl McpSession {
    pub fn new(launch: McpLaunchConfig) -> Self {
        Self {
            launch,
            client: None,
        }
    }

    /// True once `acquire` has completed and `release` has not yet run.
    pub fn is_acquired(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl ToolBackend for McpSession {
    async fn acquire(&mut self) -> Result<(), PilotError> {
        let timeout = self.launch.handshake_timeout();
        match tokio::time::timeout(timeout, McpClient::spawn(&self.launch)).await {
            Ok(Ok(client)) => {
                info!(tools = client.tools().len(), "MCP server ready");
                self.client = Some(client);
                Ok(())
            }
            Ok(Err(e)) => Err(PilotError::ServerStartup(format!("{e:#}"))),
            // The spawn future is dropped here; kill-on-drop reaps any child
            // that got as far as starting.
            Err(_) => Err(PilotError::ServerStartup(format!(
                "handshake did not complete within {}s",
                self.launch.handshake_timeout_secs
            ))),
        }
    }

    fn tool_defs(&self) -> &[McpToolDef] {
        self.client.as_ref().map(McpClient::tools).unwrap_or(&[])
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("MCP session not acquired"))?;
        client.call_tool(name, arguments).await
    }

    async fn release(&mut self) {
        match self.client.take() {
            Some(mut client) => client.shutdown().await,
            None => warn!("release called on an unacquired MCP session — no-op"),
        }
    }
}
