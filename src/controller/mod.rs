// SPDX-License-Identifier: MIT
//! The controller — the language-model-backed decision component that turns
//! a free-text request into tool invocations on the MCP session.
//!
//! The orchestrator only sees this trait; `OpenAiController` is the
//! production implementation, tests substitute canned ones.

pub mod openai;
pub mod prompts;

pub use openai::OpenAiController;

use async_trait::async_trait;

use crate::mcp::ToolBackend;

/// Dispatches one request against the tool backend and returns the final
/// answer text.  The orchestrator wraps every call in a wall-clock bound.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn dispatch(&self, request: &str, backend: &dyn ToolBackend)
        -> anyhow::Result<String>;
}
