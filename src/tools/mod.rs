//! Tool registration and execution.
//!
//! Tools are registered with a JSON schema for their input; calls extracted
//! from a model response execute sequentially in response order. A tool
//! failure never aborts the request: parse failures, schema violations, and
//! handler errors all become results fed back to the model on the next step.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::OrchestratorError;
use crate::types::{Tool, ToolCall, ToolResult};

/// Execution context handed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Id of the tool call being executed.
    pub call_id: String,
    /// Registered name of the tool.
    pub tool_name: String,
    /// The request this call belongs to. Long-running handlers can watch it
    /// for cancellation.
    pub request: RequestContext,
}

/// A caller-supplied tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool. `input` has already been parsed and validated against
    /// the declared schema.
    async fn call(&self, input: Value, ctx: &ToolContext) -> Result<Value, OrchestratorError>;
}

/// A registered tool: the declaration sent to the model plus an optional
/// handler. Declaration-only entries describe tools whose calls the caller
/// fulfills out of band.
#[derive(Clone)]
pub struct ToolEntry {
    /// Declaration sent to the backend.
    pub definition: Tool,
    /// Executable implementation, absent for declaration-only tools.
    pub handler: Option<Arc<dyn ToolHandler>>,
}

/// Ordered collection of registered tools.
#[derive(Clone, Default)]
pub struct ToolSet {
    entries: Vec<ToolEntry>,
}

impl ToolSet {
    /// Empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with an executable handler. Re-registering a name
    /// replaces the previous entry in place.
    pub fn register(&mut self, definition: Tool, handler: Arc<dyn ToolHandler>) {
        self.insert(ToolEntry {
            definition,
            handler: Some(handler),
        });
    }

    /// Register a declaration-only tool. Its calls are skipped by the
    /// executor and left for the caller to fulfill.
    pub fn register_declaration(&mut self, definition: Tool) {
        self.insert(ToolEntry {
            definition,
            handler: None,
        });
    }

    fn insert(&mut self, entry: ToolEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.definition.name == entry.definition.name)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|e| e.definition.name == name)
    }

    /// Declarations in registration order, as sent to the backend.
    pub fn definitions(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field(
                "tools",
                &self
                    .entries
                    .iter()
                    .map(|e| e.definition.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Execute the calls of one step sequentially, in response order.
///
/// Unknown tools are skipped with a warning and produce no result;
/// declaration-only tools are skipped silently. Everything else produces a
/// result, error or not.
pub(crate) async fn execute_calls(
    tools: &ToolSet,
    calls: &[ToolCall],
    request: &RequestContext,
) -> Vec<ToolResult> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        let Some(entry) = tools.get(&call.name) else {
            tracing::warn!(
                tool = %call.name,
                call_id = %call.id,
                "model requested an unregistered tool, skipping"
            );
            continue;
        };
        let Some(handler) = entry.handler.as_ref() else {
            continue;
        };

        let input = match call.parse_arguments() {
            Ok(value) => value,
            Err(e) => {
                results.push(ToolResult::new(
                    &call.id,
                    &call.name,
                    Value::String(format!("<tool error: {e}>")),
                ));
                continue;
            }
        };

        if let Err(reason) = validate_input(&entry.definition.parameters, &input, &call.name) {
            results.push(ToolResult::new(
                &call.id,
                &call.name,
                serde_json::json!({ "error": "invalid_args", "reason": reason }),
            ));
            continue;
        }

        let ctx = ToolContext {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            request: request.clone(),
        };
        let output = match handler.call(input, &ctx).await {
            Ok(value) => value,
            Err(e) => Value::String(format!("<tool error: {e}>")),
        };
        results.push(ToolResult::new(&call.id, &call.name, output));
    }
    results
}

/// Validate parsed input against the tool's parameter schema. `Err` carries
/// a message joining the first three violations. An uncompilable schema is
/// logged and treated as passing.
fn validate_input(schema: &Value, input: &Value, tool_name: &str) -> Result<(), String> {
    if !schema.is_object() {
        return Ok(());
    }
    let compiled = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            tracing::warn!(
                tool = %tool_name,
                error = %e,
                "tool parameter schema does not compile, skipping validation"
            );
            return Ok(());
        }
    };
    if compiled.validate(input).is_err() {
        let mut msgs = Vec::new();
        for err in compiled.iter_errors(input) {
            msgs.push(format!("{} at {}", err, err.instance_path));
            if msgs.len() >= 3 {
                break;
            }
        }
        return Err(msgs.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn call(&self, input: Value, _ctx: &ToolContext) -> Result<Value, OrchestratorError> {
            Ok(json!({ "echo": input }))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolHandler for FailingTool {
        async fn call(&self, _input: Value, _ctx: &ToolContext) -> Result<Value, OrchestratorError> {
            Err(OrchestratorError::tool_execution("broken", "boom"))
        }
    }

    fn open_schema() -> Value {
        json!({ "type": "object" })
    }

    fn echo_set() -> ToolSet {
        let mut tools = ToolSet::new();
        tools.register(
            Tool::new("echo", "Echo the input", open_schema()),
            Arc::new(EchoTool),
        );
        tools
    }

    #[tokio::test]
    async fn executes_in_response_order() {
        let tools = echo_set();
        let calls = vec![
            ToolCall::new("call_1", "echo", r#"{"n":1}"#),
            ToolCall::new("call_2", "echo", r#"{"n":2}"#),
        ];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id, "call_1");
        assert_eq!(results[0].output["echo"]["n"], 1);
        assert_eq!(results[1].call_id, "call_2");
        assert_eq!(results[1].output["echo"]["n"], 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn unknown_tool_is_skipped_with_warning() {
        let tools = echo_set();
        let calls = vec![
            ToolCall::new("call_1", "missing", "{}"),
            ToolCall::new("call_2", "echo", "{}"),
        ];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        // No result for the unknown tool, request not aborted.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].call_id, "call_2");
        assert!(logs_contain("unregistered tool"));
    }

    #[tokio::test]
    async fn declaration_only_tool_is_skipped_silently() {
        let mut tools = ToolSet::new();
        tools.register_declaration(Tool::new("external", "Runs elsewhere", open_schema()));
        let calls = vec![ToolCall::new("call_1", "external", "{}")];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_result() {
        let tools = echo_set();
        let calls = vec![ToolCall::new("call_1", "echo", "{not json")];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert_eq!(results.len(), 1);
        let output = results[0].output.as_str().unwrap();
        assert!(output.starts_with("<tool error:"), "got: {output}");
    }

    #[tokio::test]
    async fn schema_violation_becomes_invalid_args_result() {
        let mut tools = ToolSet::new();
        tools.register(
            Tool::new(
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
            ),
            Arc::new(EchoTool),
        );
        let calls = vec![ToolCall::new("call_1", "add", r#"{"a": "one"}"#)];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].output["error"], "invalid_args");
        assert!(!results[0].output["reason"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn uncompilable_schema_does_not_block_execution() {
        let mut tools = ToolSet::new();
        tools.register(
            Tool::new("loose", "Bad schema", json!({ "type": 42 })),
            Arc::new(EchoTool),
        );
        let calls = vec![ToolCall::new("call_1", "loose", r#"{"x":1}"#)];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].output["echo"]["x"], 1);
        assert!(logs_contain("does not compile"));
    }

    #[tokio::test]
    async fn handler_error_becomes_error_result() {
        let mut tools = ToolSet::new();
        tools.register(
            Tool::new("broken", "Always fails", open_schema()),
            Arc::new(FailingTool),
        );
        let calls = vec![ToolCall::new("call_1", "broken", "{}")];
        let results = execute_calls(&tools, &calls, &RequestContext::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].output.as_str().unwrap(),
            "<tool error: Tool 'broken' failed: boom>"
        );
    }

    #[tokio::test]
    async fn handler_sees_call_context() {
        struct ContextProbe;

        #[async_trait]
        impl ToolHandler for ContextProbe {
            async fn call(
                &self,
                _input: Value,
                ctx: &ToolContext,
            ) -> Result<Value, OrchestratorError> {
                Ok(json!({
                    "call_id": ctx.call_id,
                    "tool": ctx.tool_name,
                    "request": ctx.request.id(),
                }))
            }
        }

        let mut tools = ToolSet::new();
        tools.register(
            Tool::new("probe", "Report context", open_schema()),
            Arc::new(ContextProbe),
        );
        let request = RequestContext::new();
        let calls = vec![ToolCall::new("call_7", "probe", "{}")];
        let results = execute_calls(&tools, &calls, &request).await;
        assert_eq!(results[0].output["call_id"], "call_7");
        assert_eq!(results[0].output["tool"], "probe");
        assert_eq!(results[0].output["request"], request.id());
    }

    #[test]
    fn registration_replaces_by_name_and_keeps_order() {
        let mut tools = ToolSet::new();
        tools.register_declaration(Tool::new("a", "first", open_schema()));
        tools.register_declaration(Tool::new("b", "second", open_schema()));
        tools.register(Tool::new("a", "replaced", open_schema()), Arc::new(EchoTool));

        assert_eq!(tools.len(), 2);
        let defs = tools.definitions();
        assert_eq!(defs[0].name, "a");
        assert_eq!(defs[0].description, "replaced");
        assert_eq!(defs[1].name, "b");
        assert!(tools.get("a").unwrap().handler.is_some());
        assert!(tools.get("c").is_none());
    }
}
