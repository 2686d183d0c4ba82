//! toolstream
//!
//! A streaming orchestration engine that sits between a conversational LLM
//! provider and a fixed set of in-process tools. One user query goes in; one
//! ordered stream of events comes out:
//!
//! ```text
//! query ─► ResponseOrchestrator ─► ProviderClient (stream 1) ─► ToolCallAccumulator
//!                                      │
//!                                      ▼
//!          EventEncoder ◄─ ProviderClient (stream 2) ◄─ ToolExecutor
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures_util::StreamExt;
//! use toolstream::{EventEncoder, OrchestratorOptions, ResponseOrchestrator, ToolRegistry};
//! use toolstream::provider::{OpenAiCompatibleClient, ProviderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiCompatibleClient::new(ProviderConfig::groq("gsk-...", "llama-3.3-70b-versatile"))?;
//! let orchestrator = ResponseOrchestrator::new(
//!     Arc::new(provider),
//!     Arc::new(ToolRegistry::with_reference_tools()),
//!     OrchestratorOptions::default(),
//! );
//!
//! let mut events = orchestrator.handle("What's the weather in Paris?");
//! while let Some(event) = events.next().await {
//!     print!("{}", EventEncoder::encode(&event));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Principles
//!
//! 1. **One ordered stream**: content, tool use, tool output and follow-up text
//!    are emitted in the order they are produced, and `end` is always last.
//! 2. **Contained tool failures**: a failing tool yields a `tool_output` with
//!    `success: false`; it never aborts the response.
//! 3. **Single hop**: exactly one follow-up completion per tool call, with no
//!    tools attached.
//! 4. **Provider-agnostic**: the orchestrator only sees [`provider::ProviderClient`].

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod provider;
pub mod streaming;
pub mod telemetry;
pub mod tools;

#[cfg(feature = "server")]
pub mod server;

pub use config::Config;
pub use error::{ConfigError, EngineError, Result, ToolError};
pub use events::{Event, EventEncoder, EventKind, Payload};
pub use orchestrator::{EventStream, OrchestratorOptions, ResponseOrchestrator};
pub use streaming::{StreamDelta, ToolCall, ToolCallAccumulator, ToolUseNotice};
pub use tools::{ToolExecutor, ToolName, ToolRegistry, ToolResult};

// ============================================================================
// Core Message Types
// ============================================================================

/// A message sent to the provider.
///
/// Mirrors the OpenAI chat message shape: `tool_call_id` and `name` are only
/// set on tool-result messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// The user's query
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
            name: None,
            tool_call_id: None,
        }
    }

    /// A tool's serialized output, answering the call `tool_call_id`
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            name: Some(name.into()),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Chat role as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// OpenAI-Compatible Tool Schema
// ============================================================================

/// Function definition inside a [`ToolSchema`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the named parameters
    pub parameters: serde_json::Value,
}

/// Tool definition in the OpenAI `{"type": "function", "function": {...}}` shape
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub r#type: String,
    pub function: FunctionSchema,
}

impl ToolSchema {
    /// Create a function tool schema
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionSchema {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// The tool's registered name
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        for (role, text) in [
            (MessageRole::System, "system"),
            (MessageRole::User, "user"),
            (MessageRole::Assistant, "assistant"),
            (MessageRole::Tool, "tool"),
        ] {
            assert_eq!(serde_json::to_value(role).unwrap(), text);
            assert_eq!(role.to_string(), text);
        }
    }

    #[test]
    fn test_user_message_omits_tool_fields() {
        let json = serde_json::to_value(ChatMessage::user("Hi")).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hi");
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn test_tool_result_message_shape() {
        let msg = ChatMessage::tool_result("call_123", "get_weather", "{\"city\":\"Paris\"}");
        let json = serde_json::to_value(&msg).unwrap();

        // tool_call_id and name sit at the top level, next to role/content
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_123");
        assert_eq!(json["name"], "get_weather");
        assert_eq!(json["content"], "{\"city\":\"Paris\"}");
    }

    #[test]
    fn test_tool_schema_shape() {
        let schema = ToolSchema::function(
            "get_weather",
            "Gets weather information for a city",
            serde_json::json!({"type": "object", "properties": {}}),
        );
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_weather");
        assert_eq!(json["function"]["parameters"]["type"], "object");
        assert_eq!(schema.name(), "get_weather");
    }
}
