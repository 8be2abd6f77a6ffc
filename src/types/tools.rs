//! Tool declaration and tool call value types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool declaration as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique tool name.
    pub name: String,
    /// What the tool does, phrased for the model.
    pub description: String,
    /// JSON schema of the tool's input.
    pub parameters: Value,
}

impl Tool {
    /// Declare a tool.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// How the model may use the declared tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ToolChoice {
    /// The model decides whether to call tools.
    #[default]
    Auto,
    /// Tool calls are disabled for this request.
    None,
    /// The model must call at least one tool.
    Required,
    /// The model must call this specific tool.
    Tool {
        /// Name of the required tool.
        #[serde(rename = "toolName")]
        name: String,
    },
}

impl ToolChoice {
    /// Require a specific tool by name.
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

/// A tool invocation extracted from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id.
    pub id: String,
    /// Tool name the model asked for.
    pub name: String,
    /// Raw JSON text of the arguments. Kept unparsed so malformed output
    /// can be reported back to the model instead of failing the request.
    pub arguments: String,
}

impl ToolCall {
    /// Tool call value.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw argument text.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// The outcome of executing one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this result answers.
    pub call_id: String,
    /// Name of the tool that ran.
    pub name: String,
    /// Tool output, or an error description when execution failed.
    pub output: Value,
}

impl ToolResult {
    /// Tool result value.
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, output: Value) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_choice_serde_names() {
        assert_eq!(
            serde_json::to_value(&ToolChoice::Auto).unwrap(),
            json!({"type": "auto"})
        );
        assert_eq!(
            serde_json::to_value(&ToolChoice::Required).unwrap(),
            json!({"type": "required"})
        );
        assert_eq!(
            serde_json::to_value(&ToolChoice::tool("search")).unwrap(),
            json!({"type": "tool", "toolName": "search"})
        );
    }

    #[test]
    fn tool_call_argument_parsing() {
        let call = ToolCall::new("call_1", "search", r#"{"q": "rust"}"#);
        let parsed = call.parse_arguments().unwrap();
        assert_eq!(parsed["q"], "rust");

        let bad = ToolCall::new("call_2", "search", "{not json");
        assert!(bad.parse_arguments().is_err());
    }

    #[test]
    fn tool_declaration() {
        let tool = Tool::new(
            "add",
            "Add two numbers",
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"},
                },
                "required": ["a", "b"],
            }),
        );
        assert_eq!(tool.name, "add");
        assert_eq!(tool.parameters["required"][0], "a");
    }
}
