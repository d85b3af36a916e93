//! Conversion from service results to MCP tool results.

use fstools_kernel::ToolError;
use rmcp::model::CallToolResult;
use serde::Serialize;
use serde_json::{Value, json};

/// Wrap a payload as `{"result": ...}`.
///
/// Structured content must be a JSON object, and most payloads are arrays
/// or strings.
pub fn result_payload<T: Serialize>(value: T) -> Value {
    json!({ "result": value })
}

/// Turn a service outcome into a tool result; failures set the error flag.
pub fn into_call_result(outcome: Result<Value, ToolError>) -> CallToolResult {
    match outcome {
        Ok(payload) => CallToolResult::structured(payload),
        Err(err) => CallToolResult::structured_error(json!(err)),
    }
}
