// SPDX-License-Identifier: MIT
//! Chat-completions controller — drives the agentic tool-call loop against
//! an OpenAI-compatible endpoint.
//!
//! Each turn sends the running conversation plus the MCP tool catalogue
//! (mapped to function specs).  When the model answers with tool calls, each
//! one is executed against the backend and fed back as a `tool` message;
//! when it answers with plain text the loop ends and that text is the
//! dispatch result.  Tool execution errors are returned to the model rather
//! than aborting the turn, so it can adjust or report them.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::controller::Controller;
use crate::mcp::{McpToolDef, ToolBackend};

/// Gemini's OpenAI-compatible endpoint, as the default provider.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// The one secret credential, read once at controller construction.
/// Absence is not validated here — it surfaces as a provider auth error.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Upper bound on model round trips per dispatched request.
const MAX_TOOL_TURNS: usize = 16;
/// Tool results larger than this are cut before being fed back to the model.
const TOOL_RESULT_LIMIT: usize = 8_000;

pub struct OpenAiController {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    instructions: String,
}

impl OpenAiController {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        instructions: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            instructions,
        }
    }

    /// Construct with the API key from the environment.
    pub fn from_env(base_url: String, model: String, instructions: String) -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(api_key, base_url, model, instructions)
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ChatMessage> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
        };
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("chat completion returned {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("parse chat completion response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .context("chat completion response had no choices")
    }
}

#[async_trait]
impl Controller for OpenAiController {
    async fn dispatch(
        &self,
        request: &str,
        backend: &dyn ToolBackend,
    ) -> Result<String> {
        let specs = tool_specs(backend.tool_defs());
        let tools = (!specs.is_empty()).then_some(specs.as_slice());

        let mut messages = vec![
            ChatMessage::system(&self.instructions),
            ChatMessage::user(request),
        ];

        for turn in 0..MAX_TOOL_TURNS {
            let message = self.complete(&messages, tools).await?;
            let calls = message.tool_calls.clone().unwrap_or_default();

            if calls.is_empty() {
                return Ok(message.content.unwrap_or_default());
            }

            debug!(turn, calls = calls.len(), "executing tool calls");
            messages.push(message);
            for call in calls {
                let arguments: Value =
                    serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| json!({}));
                let outcome = match backend.call_tool(&call.function.name, arguments).await {
                    Ok(result) => result.to_string(),
                    Err(e) => {
                        warn!(tool = %call.function.name, error = %e, "tool call failed");
                        format!("tool call failed: {e:#}")
                    }
                };
                messages.push(ChatMessage::tool(&call.id, &bound(&outcome)));
            }
        }

        bail!("request abandoned after {MAX_TOOL_TURNS} tool turns without a final answer")
    }
}

/// Cut oversized tool output on a char boundary.
fn bound(text: &str) -> String {
    if text.chars().count() <= TOOL_RESULT_LIMIT {
        text.to_string()
    } else {
        text.chars().take(TOOL_RESULT_LIMIT).collect()
    }
}

/// Map the MCP tool catalogue into OpenAI function specs.
fn tool_specs(defs: &[McpToolDef]) -> Vec<ToolSpec> {
    defs.iter()
        .map(|def| ToolSpec {
            kind: "function",
            function: FunctionSpec {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: if def.input_schema.is_null() {
                    json!({ "type": "object", "properties": {} })
                } else {
                    def.input_schema.clone()
                },
            },
        })
        .collect()
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(text.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(text.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool(call_id: &str, text: &str) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(text.to_string()),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec,
}

#[derive(Serialize)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_specs_map_catalogue_to_function_specs() {
        let defs = vec![McpToolDef {
            name: "browser_navigate".to_string(),
            description: "Navigate to a URL".to_string(),
            input_schema: json!({ "type": "object" }),
        }];
        let specs = tool_specs(&defs);
        assert_eq!(specs.len(), 1);
        let rendered = serde_json::to_value(&specs[0]).unwrap();
        assert_eq!(rendered["type"], "function");
        assert_eq!(rendered["function"]["name"], "browser_navigate");
    }

    #[test]
    fn null_input_schema_becomes_empty_object_schema() {
        let defs = vec![McpToolDef {
            name: "browser_close".to_string(),
            description: String::new(),
            input_schema: Value::Null,
        }];
        let specs = tool_specs(&defs);
        let rendered = serde_json::to_value(&specs[0]).unwrap();
        assert_eq!(rendered["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn parses_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "browser_navigate",
                            "arguments": "{\"url\":\"https://example.com\"}"
                        }
                    }]
                }
            }]
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        let message = &parsed.choices[0].message;
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "browser_navigate");
        assert!(message.content.is_none());
    }

    #[test]
    fn parses_final_text_response() {
        let raw = json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Login succeeded." }
            }]
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Login succeeded.")
        );
    }

    #[test]
    fn bound_cuts_oversized_tool_output() {
        let big = "z".repeat(TOOL_RESULT_LIMIT + 100);
        assert_eq!(bound(&big).chars().count(), TOOL_RESULT_LIMIT);
        assert_eq!(bound("small"), "small");
    }
}
