//! Tool result envelopes.
//!
//! Every tool answers with the same two shapes: a success carrying the
//! pretty-printed JSON payload as text plus the same payload as structured
//! content, or an error carrying only a message and `isError: true`.

use rmcp::model::{CallToolResult, Content, RawContent};
use serde_json::Value;

/// Build a successful tool result from a JSON payload.
///
/// The first content block is the pretty-printed payload; `structured_content`
/// carries the payload itself for clients that consume typed output.
pub fn json_result(payload: Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(payload);
    result
}

/// Build an error-flagged tool result.
///
/// The message is the sole content block and no structured payload is set.
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Extract the text of every text content block, in order.
pub fn result_texts(result: &CallToolResult) -> Vec<&str> {
    result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect()
}
