//! Orchestrator output events

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event kind discriminator, as written on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Incremental assistant text
    Chunk,
    /// The model asked for a tool
    ToolUse,
    /// A tool finished (successfully or not)
    ToolOutput,
    /// A streaming phase failed
    Error,
    /// Terminal marker, always last
    End,
}

impl EventKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::ToolUse => "tool_use",
            Self::ToolOutput => "tool_output",
            Self::Error => "error",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event payload before wire encoding
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw text; normalized if it is a JSON object literal
    Text(String),
    /// Structured value
    Json(Value),
    /// No data
    Empty,
}

/// One unit of the orchestrator's output stream
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Chunk(String),
    ToolUse { name: String, parameters: Value },
    ToolOutput { name: String, output: Value, success: bool },
    Error { message: String },
    End,
}

impl Event {
    pub fn chunk(text: impl Into<String>) -> Self {
        Self::Chunk(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Chunk(_) => EventKind::Chunk,
            Self::ToolUse { .. } => EventKind::ToolUse,
            Self::ToolOutput { .. } => EventKind::ToolOutput,
            Self::Error { .. } => EventKind::Error,
            Self::End => EventKind::End,
        }
    }

    /// Wire payload for this event
    pub fn payload(&self) -> Payload {
        match self {
            Self::Chunk(text) => Payload::Text(text.clone()),
            Self::ToolUse { name, parameters } => Payload::Json(json!({
                "name": name,
                "parameters": parameters,
            })),
            Self::ToolOutput {
                name,
                output,
                success,
            } => Payload::Json(json!({
                "name": name,
                "output": output,
                "success": success,
            })),
            Self::Error { message } => Payload::Json(json!({ "error": message })),
            Self::End => Payload::Empty,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}
