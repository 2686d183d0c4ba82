//! Tool executor: the error-containment boundary around tool dispatch.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ToolRegistry;
use crate::error::ToolError;
use crate::ToolSchema;

/// Outcome of one tool call.
///
/// `success` is false only for engine-level failures (unknown tool, bad
/// arguments). A negative business answer is `success: true` with the tool's
/// own status inside `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub output: Value,
    pub success: bool,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, output: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            output,
            success: true,
        }
    }

    /// Failure result carrying `{"error": <message>}`
    pub fn failure(tool_name: impl Into<String>, error: &ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: json!({ "error": error.to_string() }),
            success: false,
        }
    }
}

/// Parses arguments and dispatches to the registry. Never returns an error.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn schemas(&self) -> &[ToolSchema] {
        self.registry.schemas()
    }

    #[tracing::instrument(name = "tool.execute", skip_all, fields(tool = %name))]
    pub async fn execute(&self, name: &str, raw_arguments: &str) -> ToolResult {
        let started = Instant::now();
        match self.try_execute(name, raw_arguments).await {
            Ok(output) => {
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "tool completed");
                ToolResult::success(name, output)
            }
            Err(err) => {
                warn!(error = %err, "tool execution failed");
                ToolResult::failure(name, &err)
            }
        }
    }

    async fn try_execute(&self, name: &str, raw_arguments: &str) -> Result<Value, ToolError> {
        let tool = self.registry.resolve(name)?;
        let arguments = parse_arguments(raw_arguments)?;
        self.registry.dispatch(tool, arguments).await
    }
}

/// Blank input is `{}`; anything else must be a JSON object.
fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ToolError::MalformedArguments(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(ToolError::MalformedArguments(e.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
