//! Provider boundary.
//!
//! The orchestrator talks to a model only through [`ProviderClient`]. Each
//! supported vendor family gets its own adapter; vendor wire formats never
//! leak past it.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::Result;
use crate::streaming::{StreamDelta, ToolCall};
use crate::{ChatMessage, EngineError, ToolSchema};

mod openai_compat;
pub mod scripted;

pub use openai_compat::{OpenAiCompatibleClient, ProviderConfig};
pub use scripted::{ScriptedProvider, ScriptedTurn};

/// Lazy sequence of deltas for one completion. Dropping it closes the
/// underlying connection.
pub type DeltaStream =
    Pin<Box<dyn Stream<Item = std::result::Result<StreamDelta, EngineError>> + Send>>;

/// One streaming completion request
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub messages: Vec<ChatMessage>,
    /// Tools offered to the model; `None` forbids tool use
    pub tools: Option<Vec<ToolSchema>>,
    /// Let the model decide whether to call a tool
    pub allow_tool_choice: bool,
}

impl StreamRequest {
    /// First-phase request: the query alone, with every tool attached
    pub fn initial(query: &str, tools: &[ToolSchema]) -> Self {
        Self {
            messages: vec![ChatMessage::user(query)],
            tools: Some(tools.to_vec()),
            allow_tool_choice: true,
        }
    }

    /// Follow-up request: the query plus one tool result, and no tools
    pub fn follow_up(query: &str, call: &ToolCall, output: &serde_json::Value) -> Self {
        Self {
            messages: vec![
                ChatMessage::user(query),
                ChatMessage::tool_result(&call.id, &call.name, output.to_string()),
            ],
            tools: None,
            allow_tool_choice: false,
        }
    }
}

/// A streaming chat-completion backend
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short provider label for logs
    fn name(&self) -> &str;

    /// Start a completion and return its delta stream.
    ///
    /// Errors before the first delta (connect, auth, bad status) are returned
    /// here; errors after that arrive as `Err` items on the stream.
    async fn open_stream(&self, request: StreamRequest) -> Result<DeltaStream>;
}
