//! Webpilot — LLM-driven browser automation sessions with durable reports.
//!
//! The orchestrator starts a Playwright MCP server subprocess, binds an
//! LLM-backed controller to its tool catalogue, drives a bounded-time
//! request loop, and on every exit path collects screenshot artifacts and
//! renders an HTML session report before releasing the server.

pub mod config;
pub mod controller;
pub mod error;
pub mod mcp;
pub mod orchestrator;
pub mod report;
pub mod session;

pub use config::McpLaunchConfig;
pub use controller::{Controller, OpenAiController};
pub use error::PilotError;
pub use mcp::{McpSession, ToolBackend};
pub use orchestrator::{OrchestratorState, SessionOrchestrator};
pub use session::{Session, SessionStatus};
