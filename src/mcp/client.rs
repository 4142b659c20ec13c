// SPDX-License-Identifier: MIT
/// MCP client — talks to the Playwright MCP server via a stdio subprocess.
///
/// `McpClient` spawns the server process and communicates with it over its
/// stdin/stdout pipes using the JSON-RPC 2.0 MCP protocol.  Each request gets
/// a monotonically incrementing integer ID.  The tool catalogue is fetched
/// once during `spawn` and cached for the lifetime of the client — callers
/// never trigger a `tools/list` round trip per request.
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::McpLaunchConfig;
use crate::mcp::tools::McpToolDef;

/// A live connection to one MCP server process.
pub struct McpClient {
    /// Display name for logging.
    name: String,
    /// The child process.  Spawned with kill-on-drop so an abandoned
    /// handshake (e.g. the acquisition timeout firing) cannot leak it.
    child: Option<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    next_id: AtomicU64,
    /// Tool catalogue, fetched once at spawn.
    tools: Vec<McpToolDef>,
}

impl McpClient {
    /// Spawn the MCP server subprocess, run the `initialize` handshake, and
    /// fetch the tool catalogue.
    pub async fn spawn(config: &McpLaunchConfig) -> Result<Self> {
        let mut cmd = tokio::process::Command::new(&config.command);
        cmd.args(config.args());
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::null());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn MCP server '{}'", config.command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("MCP server stdin not available"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("MCP server stdout not available"))?;

        let mut client = Self {
            name: "Playwright MCP server".to_string(),
            child: Some(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicU64::new(1),
            tools: Vec::new(),
        };

        client.initialize().await?;
        client.tools = client.fetch_tools().await?;
        debug!(
            server = %client.name,
            tools = client.tools.len(),
            "MCP tool catalogue cached"
        );

        Ok(client)
    }

    /// The cached tool catalogue.
    pub fn tools(&self) -> &[McpToolDef] {
        &self.tools
    }

    /// Call a tool on the MCP server.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let params = json!({
            "name": name,
            "arguments": arguments
        });
        self.send_request("tools/call", Some(params)).await
    }

    /// Kill the server process and reap it.  Idempotent.
    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
            debug!(server = %self.name, "MCP server process terminated");
        }
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send a JSON-RPC request and read back the response with the matching ID.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let req = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params.unwrap_or(Value::Null)
        });
        self.write_line(&req).await?;

        // MCP servers send one JSON object per line, but not every line is our
        // response: the server interleaves notifications (no `id`), and a
        // response to a request the caller abandoned at its timeout may still
        // be sitting in the pipe.  Read until the ID matches ours so a stale
        // payload is never handed to the wrong request.
        let resp = {
            let mut stdout = self.stdout.lock().await;
            loop {
                let mut buf = String::new();
                let read = stdout
                    .read_line(&mut buf)
                    .await
                    .context("read from MCP server stdout")?;
                if read == 0 {
                    return Err(anyhow::anyhow!(
                        "MCP server '{}' closed stdout unexpectedly",
                        self.name
                    ));
                }
                let line = buf.trim();
                if line.is_empty() {
                    continue;
                }
                let msg: Value =
                    serde_json::from_str(line).context("parse MCP server response")?;
                match msg.get("id").and_then(Value::as_u64) {
                    // Notification or server-initiated request, not a response.
                    None => continue,
                    Some(stale) if stale != id => {
                        debug!(server = %self.name, stale, "discarding stale MCP response");
                        continue;
                    }
                    Some(_) => break msg,
                }
            }
        };

        if let Some(error) = resp.get("error") {
            return Err(anyhow::anyhow!("MCP server returned error: {}", error));
        }

        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn write_line(&self, message: &Value) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .context("write to MCP server stdin")?;
        stdin.flush().await?;
        Ok(())
    }

    /// Send the MCP `initialize` request and the `initialized` notification.
    async fn initialize(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "webpilot",
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let result = self.send_request("initialize", Some(params)).await?;
        debug!(
            server = %self.name,
            protocol = result.get("protocolVersion").and_then(|v| v.as_str()).unwrap_or("?"),
            "MCP server initialized"
        );

        // Notification — no response expected.
        let notif = json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        });
        self.write_line(&notif).await
    }

    /// Fetch the tool catalogue via `tools/list`.
    async fn fetch_tools(&self) -> Result<Vec<McpToolDef>> {
        let result = self.send_request("tools/list", None).await?;
        let raw_tools = result
            .get("tools")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(raw_tools
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}
