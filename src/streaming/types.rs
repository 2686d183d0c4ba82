//! Type definitions for provider stream deltas and reassembled tool calls.

use serde::{Deserialize, Serialize};

/// Incremental unit emitted by a provider stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamDelta {
    /// Text content fragment
    Content { text: String },
    /// Tool call fragment (index-based like the OpenAI SSE format).
    /// `id` and `name` usually arrive once; `arguments_delta` is appended.
    ToolCallFragment {
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments_delta: Option<String>,
    },
}

impl StreamDelta {
    /// Content fragment
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// A complete tool call in a single fragment
    pub fn tool_call(
        index: usize,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCallFragment {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments_delta: Some(arguments.into()),
        }
    }

    /// A continuation fragment carrying only argument text
    pub fn arguments(index: usize, arguments_delta: impl Into<String>) -> Self {
        Self::ToolCallFragment {
            index,
            id: None,
            name: None,
            arguments_delta: Some(arguments_delta.into()),
        }
    }
}

/// A tool call reassembled from the first stream.
///
/// `arguments` is the raw JSON text exactly as streamed; it is parsed by the
/// executor so a malformed buffer only fails that one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call identifier
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Raw JSON argument text
    pub arguments: String,
}

/// Raised the first time a call's tool name becomes known
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUseNotice {
    pub index: usize,
    pub name: String,
    /// Best-effort parse of the arguments seen so far
    pub parameters: serde_json::Value,
}
