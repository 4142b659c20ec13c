// SPDX-License-Identifier: MIT
//! Wire-level tests for `McpSession` against a scripted stdio server.
//!
//! The script speaks just enough JSON-RPC to complete the handshake and
//! answer two tool calls, with a deliberately slow first tool.  That lets
//! these tests exercise the stdout framing the in-memory fakes cannot:
//! notifications interleaved with responses, and a response arriving after
//! its caller already gave up waiting.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use webpilot::config::McpLaunchConfig;
use webpilot::mcp::{McpSession, ToolBackend};

/// Replies in request order: the client numbers requests from 1, so the
/// handshake is id 1, the tool listing id 2, and tool calls follow.  The
/// `slow_tool` reply is held back for a full second; `fast_tool` answers
/// immediately after it.  A stray progress notification precedes the tool
/// listing to make sure id-less lines are passed over.
const SCRIPTED_SERVER: &str = r#"#!/bin/sh
read line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}'
read line
printf '%s\n' '{"jsonrpc":"2.0","method":"notifications/progress","params":{"progress":1}}'
read line
printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"slow_tool","description":"","inputSchema":{"type":"object"}},{"name":"fast_tool","description":"","inputSchema":{"type":"object"}}]}}'
read line
sleep 1
printf '%s\n' '{"jsonrpc":"2.0","id":3,"result":{"echo":"slow_tool"}}'
read line
printf '%s\n' '{"jsonrpc":"2.0","id":4,"result":{"echo":"fast_tool"}}'
"#;

fn write_scripted_server(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("scripted-mcp-server.sh");
    std::fs::write(&path, SCRIPTED_SERVER).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn scripted_launch(dir: &TempDir) -> McpLaunchConfig {
    let mut launch = McpLaunchConfig::new(dir.path().join("output"));
    launch.command = write_scripted_server(dir).to_string_lossy().into_owned();
    launch
}

#[tokio::test]
async fn handshake_skips_interleaved_notifications() {
    let dir = TempDir::new().unwrap();
    let mut session = McpSession::new(scripted_launch(&dir));

    // The progress notification sits in the pipe ahead of the tools/list
    // response; acquisition only succeeds if it gets passed over.
    session.acquire().await.unwrap();

    let names: Vec<&str> = session.tool_defs().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["slow_tool", "fast_tool"]);

    session.release().await;
}

#[tokio::test]
async fn abandoned_call_does_not_corrupt_the_next_one() {
    let dir = TempDir::new().unwrap();
    let mut session = McpSession::new(scripted_launch(&dir));
    session.acquire().await.unwrap();

    // Give up on the slow tool long before its reply arrives.  The request
    // already went out over stdin, so its reply will land in the pipe later.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        session.call_tool("slow_tool", json!({})),
    )
    .await;
    assert!(abandoned.is_err(), "slow_tool reply should outlast the bound");

    // The next call must get its own reply, not the slow tool's late one.
    let result = session.call_tool("fast_tool", json!({})).await.unwrap();
    assert_eq!(result["echo"], "fast_tool");

    session.release().await;
}
