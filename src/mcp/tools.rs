// SPDX-License-Identifier: MIT
// MCP tool definition type, as returned by `tools/list`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single MCP tool definition.
///
/// The Playwright MCP server advertises its browser-control primitives
/// (navigate, click, fill, screenshot, ...) in this shape.  The controller
/// maps these into function specs for the language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_from_tools_list_entry() {
        let raw = json!({
            "name": "browser_navigate",
            "description": "Navigate to a URL",
            "inputSchema": {
                "type": "object",
                "required": ["url"],
                "properties": { "url": { "type": "string" } }
            }
        });
        let def: McpToolDef = serde_json::from_value(raw).unwrap();
        assert_eq!(def.name, "browser_navigate");
        assert_eq!(def.input_schema["required"][0], "url");
    }

    #[test]
    fn missing_description_and_schema_default() {
        let def: McpToolDef =
            serde_json::from_value(json!({ "name": "browser_close" })).unwrap();
        assert!(def.description.is_empty());
        assert!(def.input_schema.is_null());
    }
}
